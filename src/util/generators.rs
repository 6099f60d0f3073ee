use rand::Rng;

const HEX_DIGITS: &[u8] = b"0123456789abcdef";

/// Produces an identifier shaped like the ones EC2 hands out, e.g. `i-0f3a9c...`.
pub fn generate_instance_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..17)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect();

    format!("i-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_instance_id_shape() {
        let id = generate_instance_id();

        assert!(id.starts_with("i-"));
        assert_eq!(id.len(), 19);
        assert!(id[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_instance_id());
    }
}
