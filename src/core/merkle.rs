use crate::utils::sha256_hex;

/// Merkle root over an ordered list of hex leaf strings.
///
/// This follows the Bitcoin shape: pair neighbours level by level, hash the
/// concatenated hex strings, and duplicate the last element of an odd level.
/// The output must be byte-for-byte identical on every node, so the rules
/// are applied in a fixed order:
///
/// 1. empty or whitespace leaves are dropped,
/// 2. an empty filtered list collapses to `sha256_hex("")`,
/// 3. otherwise levels are reduced until a single element remains.
pub fn compute_root(leaves: &[String]) -> String {
    let mut level: Vec<String> = leaves
        .iter()
        .filter(|leaf| !leaf.trim().is_empty())
        .cloned()
        .collect();

    if level.is_empty() {
        return sha256_hex(b"");
    }

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let combined = match pair {
                [left, right] => format!("{left}{right}"),
                // Odd level: the last element is paired with itself.
                [last] => format!("{last}{last}"),
                _ => unreachable!("chunks(2) yields one or two elements"),
            };
            next.push(sha256_hex(combined.as_bytes()));
        }
        level = next;
    }

    level.remove(0)
}
