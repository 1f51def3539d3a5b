use sha3::{Digest, Sha3_256};

/// Passwords are stored as upper-case hex SHA3-256 of `username:password`.
pub fn hash_password(username: &str, pwd: &str) -> String {
    let mut hasher = Sha3_256::default();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(pwd.as_bytes());
    format!("{:X}", hasher.finalize())
}

pub fn verify_password(username: &str, pwd: &str, pwd_hash: &str) -> bool {
    hash_password(username, pwd).eq_ignore_ascii_case(pwd_hash)
}
