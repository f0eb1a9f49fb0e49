use std::collections::HashMap;

/// Character trie used to find every affix whose text starts a given word
#[derive(Debug)]
pub(crate) struct Trie<V> {
	root: TrieNode<V>,
	len: usize,
}

impl<V> Default for Trie<V> {
	fn default() -> Self {
		Self {
			root: TrieNode::default(),
			len: 0,
		}
	}
}

#[derive(Debug)]
struct TrieNode<V> {
	leaves: HashMap<char, Self>,
	data: Vec<V>,
}

impl<V> Default for TrieNode<V> {
	fn default() -> Self {
		Self {
			leaves: HashMap::default(),
			data: Vec::new(),
		}
	}
}

impl<V> Trie<V> {
	pub(crate) const fn len(&self) -> usize {
		self.len
	}

	pub(crate) fn insert(&mut self, key: &str, value: V) {
		let mut current = &mut self.root;
		for char in key.chars() {
			current = current.leaves.entry(char).or_default();
		}

		current.data.push(value);
		self.len += 1;
	}

	/// Values stored under every prefix of `key`, the empty one included,
	/// shortest prefix first
	pub(crate) fn values_along(&self, key: &str) -> Vec<&V> {
		let mut current = &self.root;
		let mut results = current.data.iter().collect::<Vec<_>>();

		for char in key.chars() {
			current = match current.leaves.get(&char) {
				Some(v) => v,
				None => break,
			};

			results.extend(&current.data);
		}

		results
	}
}
