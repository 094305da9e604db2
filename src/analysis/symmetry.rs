//! Left/right detection on bone names.

use serde::{Deserialize, Serialize};

/// Whether a bone name carries a left-side token (`l_` prefix, `_l` suffix or `left`)
pub fn is_left_name(name: &str) -> bool {
    has_side_token(name, "l_", "_l", "left")
}

/// Whether a bone name carries a right-side token (`r_` prefix, `_r` suffix or `right`)
pub fn is_right_name(name: &str) -> bool {
    has_side_token(name, "r_", "_r", "right")
}

fn has_side_token(name: &str, prefix: &str, suffix: &str, word: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with(prefix) || lower.ends_with(suffix) || lower.contains(word)
}

/// A skeleton is symmetric when it has both left and right bones.
/// Without bones the model is assumed to be a symmetric humanoid.
pub fn detect_symmetry<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    let mut any = false;
    let mut left = false;
    let mut right = false;
    for name in names {
        any = true;
        left |= is_left_name(name);
        right |= is_right_name(name);
        if left && right {
            return true;
        }
    }
    !any
}

/// Name of the opposite-side bone, preserving the token's letter case.
///
/// Rules are tried in order (prefix, suffix, word) and only the first one
/// that applies is used.
pub fn mirror_bone_name(name: &str) -> Option<String> {
    if let Some(head) = name.get(..2) {
        if let Some(swapped) = swap_token(head, &[("l_", "r_"), ("r_", "l_")]) {
            return Some(format!("{swapped}{}", &name[2..]));
        }
    }

    if name.len() >= 2 {
        if let Some(tail) = name.get(name.len() - 2..) {
            if let Some(swapped) = swap_token(tail, &[("_l", "_r"), ("_r", "_l")]) {
                return Some(format!("{}{swapped}", &name[..name.len() - 2]));
            }
        }
    }

    let lower = name.to_ascii_lowercase();
    for (from, to) in [("left", "right"), ("right", "left")] {
        if let Some(at) = lower.find(from) {
            let original = &name[at..at + from.len()];
            let replacement = match_case(original, to);
            return Some(format!("{}{replacement}{}", &name[..at], &name[at + from.len()..]));
        }
    }

    None
}

fn swap_token(token: &str, pairs: &[(&str, &str)]) -> Option<String> {
    pairs
        .iter()
        .find(|(from, _)| token.eq_ignore_ascii_case(from))
        .map(|(_, to)| match_case(token, to))
}

/// Give `to` the capitalization style of `like` (all upper, leading upper, or lower)
fn match_case(like: &str, to: &str) -> String {
    let letters: Vec<char> = like.chars().filter(char::is_ascii_alphabetic).collect();
    if letters.len() > 1 && letters.iter().all(char::is_ascii_uppercase) {
        return to.to_ascii_uppercase();
    }
    match letters.first() {
        Some(c) if c.is_ascii_uppercase() => {
            let mut out = String::with_capacity(to.len());
            let mut upper_done = false;
            for ch in to.chars() {
                if !upper_done && ch.is_ascii_alphabetic() {
                    out.push(ch.to_ascii_uppercase());
                    upper_done = true;
                } else {
                    out.push(ch);
                }
            }
            out
        }
        _ => to.to_string(),
    }
}

/// Left/right pairing of a bone list, computed once per skeleton
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonePairing {
    pairs: Vec<Option<usize>>,
}

impl BonePairing {
    /// Pair every bone with the bone carrying its mirrored name
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: Vec<&str> = names.into_iter().collect();
        let index: std::collections::HashMap<&str, usize> =
            names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let pairs = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                mirror_bone_name(name)
                    .and_then(|m| index.get(m.as_str()).copied())
                    .filter(|&j| j != i)
            })
            .collect();

        Self { pairs }
    }

    /// Index of the mirror of bone `index`
    pub fn mirror_of(&self, index: usize) -> Option<usize> {
        self.pairs.get(index).copied().flatten()
    }

    /// Number of bones that found a partner
    pub fn paired_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_tokens() {
        assert!(is_left_name("L_Arm"));
        assert!(is_left_name("arm_l"));
        assert!(is_left_name("LeftHand"));
        assert!(is_right_name("mixamorig:RightFoot"));
        assert!(!is_left_name("Spine"));
    }

    #[test]
    fn test_detect_symmetry() {
        assert!(detect_symmetry(["L_Arm", "R_Arm", "Spine"]));
        assert!(!detect_symmetry(["L_Arm", "Spine"]));
        assert!(detect_symmetry(std::iter::empty()));
    }

    #[test]
    fn test_mirror_names() {
        assert_eq!(mirror_bone_name("L_Elbow").as_deref(), Some("R_Elbow"));
        assert_eq!(mirror_bone_name("r_knee").as_deref(), Some("l_knee"));
        assert_eq!(mirror_bone_name("thigh_L").as_deref(), Some("thigh_R"));
        assert_eq!(mirror_bone_name("mixamorig:LeftArm").as_deref(), Some("mixamorig:RightArm"));
        assert_eq!(mirror_bone_name("RIGHT_EYE").as_deref(), Some("LEFT_EYE"));
        assert_eq!(mirror_bone_name("Spine"), None);
    }

    #[test]
    fn test_prefix_rule_wins_over_word_rule() {
        // only the prefix is swapped
        assert_eq!(mirror_bone_name("L_LeftTwist").as_deref(), Some("R_LeftTwist"));
    }

    #[test]
    fn test_pairing() {
        let names = ["Hips", "L_Arm", "R_Arm", "L_Hand"];
        let pairing = BonePairing::from_names(names);
        assert_eq!(pairing.len(), 4);
        assert_eq!(pairing.mirror_of(0), None);
        assert_eq!(pairing.mirror_of(1), Some(2));
        assert_eq!(pairing.mirror_of(2), Some(1));
        assert_eq!(pairing.mirror_of(3), None);
        assert_eq!(pairing.paired_count(), 2);
    }
}
