use rand::{distributions::Alphanumeric, Rng};

pub const SHORT_ID_LEN: usize = 6;

/// Random `[A-Za-z0-9]` string of the given length.
pub fn generate_short_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Rolls ids until one is not taken. There is no retry bound.
pub fn generate_unique(is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = generate_short_id(SHORT_ID_LEN);
        if !is_taken(&candidate) {
            return candidate;
        }
        tracing::debug!("Short id collision on {}, rolling again", candidate);
    }
}
