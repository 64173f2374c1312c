//! Challenge-response authentication for the identify frame.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::messages::AuthChallenge;

/// Computes the identify authentication string.
///
/// `secret = base64(sha256(password + salt))`, then
/// `base64(sha256(secret + challenge))`.
pub fn auth_response(password: &str, challenge: &str, salt: &str) -> String {
    let secret = sha256_base64(&format!("{password}{salt}"));
    sha256_base64(&format!("{secret}{challenge}"))
}

/// Returns the authentication string for a hello, if one is needed.
///
/// `None` when the server sent no challenge or no password is configured.
pub fn authentication_for(challenge: Option<&AuthChallenge>, password: &str) -> Option<String> {
    match challenge {
        Some(c) if !password.is_empty() => Some(auth_response(password, &c.challenge, &c.salt)),
        _ => None,
    }
}

fn sha256_base64(input: &str) -> String {
    STANDARD.encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_is_deterministic() {
        let a = auth_response("supersecret", "challenge-1", "salt-1");
        let b = auth_response("supersecret", "challenge-1", "salt-1");
        assert_eq!(a, b);
    }

    #[test]
    fn auth_response_is_base64_sha256() {
        let resp = auth_response("pw", "ch", "sa");
        // 32 bytes of digest encode to 44 base64 characters with padding.
        assert_eq!(resp.len(), 44);
        assert!(resp.ends_with('='));
        assert_eq!(STANDARD.decode(&resp).unwrap().len(), 32);
    }

    #[test]
    fn auth_response_matches_two_rounds() {
        let first = STANDARD.encode(Sha256::digest(b"pwsa"));
        let expected = STANDARD.encode(Sha256::digest(format!("{first}ch").as_bytes()));
        assert_eq!(auth_response("pw", "ch", "sa"), expected);
    }

    #[test]
    fn auth_response_depends_on_every_input() {
        let base = auth_response("pw", "ch", "sa");
        assert_ne!(base, auth_response("pw2", "ch", "sa"));
        assert_ne!(base, auth_response("pw", "ch2", "sa"));
        assert_ne!(base, auth_response("pw", "ch", "sa2"));
    }

    #[test]
    fn authentication_skipped_without_challenge() {
        assert!(authentication_for(None, "pw").is_none());
    }

    #[test]
    fn authentication_skipped_without_password() {
        let challenge = AuthChallenge {
            challenge: "ch".into(),
            salt: "sa".into(),
        };
        assert!(authentication_for(Some(&challenge), "").is_none());
        assert_eq!(
            authentication_for(Some(&challenge), "pw"),
            Some(auth_response("pw", "ch", "sa"))
        );
    }
}
