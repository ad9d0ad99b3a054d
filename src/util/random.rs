use crate::core::types::StateToken;

pub trait FromRandom {
    fn from_random() -> Self;
}

impl FromRandom for StateToken {
    fn from_random() -> Self {
        StateToken(random_string(32))
    }
}

fn random_string(size: usize) -> String {
    use rand::Rng;

    let s: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(size)
        .map(|b| b as char)
        .collect();
    base64::encode_config(s, base64::URL_SAFE_NO_PAD)
}
