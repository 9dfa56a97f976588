//! Per-emotion improvement suggestions, used when upstream advice is empty.

/// Three suggestions for the given emotion; unknown labels get the neutral
/// set.
pub fn for_label(label: &str) -> &'static [&'static str] {
    match label {
        "angry" => &[
            "Slow the pace slightly to release pressure from key sentences.",
            "Soften volume and hardness on the points you most want heard.",
            "Lead with cooperative phrasing such as \"let's consider\".",
        ],
        "disgust" => &[
            "Prefer positive wording over flat rejection.",
            "Flatten the tone a little to keep bias out of the delivery.",
            "Separate opinion from fact explicitly.",
        ],
        "fear" => &[
            "Take a deep breath before speaking to steady the tone.",
            "Stress key words slowly and clearly, on a fixed rhythm.",
            "Rehearse with a short script to build confidence.",
        ],
        "happy" => &[
            "Avoid holding a loud level for long stretches.",
            "Pause before the punchline for extra impact.",
            "Alternate high and low tone slightly so it never overflows.",
        ],
        "sad" => &[
            "Lift the tone a little when opening and closing sentences.",
            "Add a touch of tempo to bring energy and optimism.",
            "Use forward-looking phrasing such as \"the way out is\".",
        ],
        "surprise" => &[
            "Reserve the high pitch for genuine highlights.",
            "Insert a short pause before the twist.",
            "Close on a steady tone to restore balance.",
        ],
        _ => &[
            "Add a little weight to key words to avoid flatness.",
            "Use examples or open questions to hold attention.",
            "Mark sentence endings with a clear pause to separate points.",
        ],
    }
}
