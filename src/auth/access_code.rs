use rand::Rng;

pub const ACCESS_CODE_LEN: usize = 6;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random class access code, e.g. `K7Q2ZD`.
pub fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn is_access_code(code: &str) -> bool {
    code.len() == ACCESS_CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}
