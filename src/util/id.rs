use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of generated ids (the host's document id length)
pub const ID_LENGTH: usize = 16;

/// A fresh random alphanumeric id
pub fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}

/// A random id not rejected by `taken`
pub fn unique_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = random_id();
        if !taken(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_alphanumeric() {
        let id = random_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn unique_id_skips_taken() {
        let first = random_id();
        let id = unique_id(|candidate| candidate == first);
        assert_ne!(id, first);
    }
}
