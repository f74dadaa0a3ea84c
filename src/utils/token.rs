use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Random lowercase-alphanumeric secret, used for admin password resets.
pub fn generate_password(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}
