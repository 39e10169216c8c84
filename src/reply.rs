use rand::Rng;

use crate::models::Reply;

const YES_OR_NO_KEYWORDS: [&str; 4] = ["do", "does", "are", "is"];
const LIST_KEYWORDS: [&str; 1] = ["some"];
const NUMBER_KEYWORDS: [&str; 2] = ["sum", "number"];

const MAX_NUMBER: u32 = 100;
const LIST_LENGTH: usize = 3;
const STRING_LENGTH: usize = 5;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Classifies a prompt by keyword and produces a matching answer. The first
/// rule that matches wins: yes/no question > list request > number request >
/// random fallback.
pub fn generate_reply<R: Rng>(prompt: &str, rng: &mut R) -> Reply {
    let lowered = prompt.to_lowercase();
    if YES_OR_NO_KEYWORDS.iter().any(|kw| lowered.starts_with(kw)) {
        Reply::Text("yes".to_string())
    } else if LIST_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Reply::Items(
            (0..LIST_LENGTH)
                .map(|_| random_string(rng, STRING_LENGTH))
                .collect(),
        )
    } else if NUMBER_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Reply::Text(rng.random_range(0..MAX_NUMBER).to_string())
    } else {
        Reply::Text(random_string(rng, STRING_LENGTH))
    }
}

fn random_string<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}
