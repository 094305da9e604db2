//! Mapping of embedded-skeleton bone names onto catalog joints.

/// Ordered `(substring, joint id)` table. A bone fills every entry whose
/// substring occurs in its normalized name and whose joint is still
/// unfilled.
#[rustfmt::skip]
pub const BONE_NAME_TABLE: &[(&str, &str)] = &[
    ("hip",        "hips"),
    ("pelv",       "hips"),
    ("spine",      "spine1"),
    ("chest",      "chest"),
    ("neck",       "neck"),
    ("head",       "head"),
    ("l_shoulder", "l_shoulder"),
    ("r_shoulder", "r_shoulder"),
    ("l_arm",      "l_upper_arm"),
    ("r_arm",      "r_upper_arm"),
    ("l_elbow",    "l_elbow"),
    ("r_elbow",    "r_elbow"),
    ("l_wrist",    "l_wrist"),
    ("r_wrist",    "r_wrist"),
    ("l_up_leg",   "l_hip"),
    ("r_up_leg",   "r_hip"),
    ("l_leg",      "l_knee"),
    ("r_leg",      "r_knee"),
    ("l_foot",     "l_ankle"),
    ("r_foot",     "r_ankle"),
];

/// Lowercase a bone name and turn whitespace and dashes into underscores
pub fn normalize_bone_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Joint ids for a bone name in table order, skipping joints for which
/// `is_filled` is true. Each joint appears at most once.
pub fn match_bone<F>(name: &str, is_filled: F) -> Vec<&'static str>
where
    F: Fn(&str) -> bool,
{
    let normalized = normalize_bone_name(name);
    let mut joints: Vec<&'static str> = Vec::new();
    for &(pattern, joint) in BONE_NAME_TABLE {
        if normalized.contains(pattern) && !is_filled(joint) && !joints.contains(&joint) {
            joints.push(joint);
        }
    }
    joints
}
