use indexmap::IndexMap;

/// Insertion-ordered string-keyed map. Inserting an existing key replaces the value and
/// keeps the key at its first position.
pub type Keyed<V> = IndexMap<String, V>;
