//! Keyword-driven sample outputs served by the demo backend in place of a
//! real captioning model.

pub const SAMPLE_CAPTIONS: [&str; 5] = [
    "A beautiful sunset over the mountains with vibrant orange and purple hues.",
    "A cute golden retriever puppy playing with a red ball in a green field.",
    "A modern kitchen with granite countertops and stainless steel appliances.",
    "A crowded city street with people walking under colorful umbrellas in the rain.",
    "A serene lake surrounded by pine trees reflecting the clear blue sky.",
];

pub const SAMPLE_SUMMARIES: [&str; 5] = [
    "The camera pans slowly across a mountain range as the sun sets and the sky shifts from orange to purple.",
    "A puppy chases a red ball back and forth across a sunny field before lying down in the grass.",
    "A tour of a bright modern kitchen, lingering on the countertops and appliances.",
    "Pedestrians with umbrellas cross a busy street while rain falls and traffic passes.",
    "A still lake reflects the surrounding pines; a light breeze ripples the water.",
];

pub const SAMPLE_IMAGES: [&str; 5] = [
    "/static/images/sunset.jpeg",
    "/static/images/dog.jpeg",
    "/static/images/kitchen.jpeg",
    "/static/images/citystreet.jpeg",
    "/static/images/lake.jpeg",
];

const LAKE: usize = 4;

fn pick(text: &str, groups: &[(&[&str], usize)]) -> usize {
    let lower = text.to_lowercase();
    groups
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, idx)| *idx)
        .unwrap_or(LAKE)
}

/// Index into the samples for an uploaded file name.
pub fn sample_for_filename(filename: &str) -> usize {
    pick(filename, &[
        (&["nature", "landscape"], 0),
        (&["dog", "pet"], 1),
        (&["kitchen", "home"], 2),
        (&["city", "street"], 3),
    ])
}

/// Index into the samples for a caption.
pub fn sample_for_caption(caption: &str) -> usize {
    pick(caption, &[
        (&["sunset", "mountain"], 0),
        (&["dog", "puppy", "pet"], 1),
        (&["kitchen", "home"], 2),
        (&["city", "street", "rain"], 3),
    ])
}

pub fn caption_for_filename(filename: &str) -> &'static str {
    SAMPLE_CAPTIONS[sample_for_filename(filename)]
}

pub fn image_for_caption(caption: &str) -> &'static str {
    SAMPLE_IMAGES[sample_for_caption(caption)]
}

pub fn video_for_style(style: &str) -> String {
    format!("/static/videos/{}.mp4", style)
}

/// Keeps only the last path component; ASCII letters, digits, `.`, `-` and
/// `_` survive, whitespace becomes `_`, and leading or trailing `.`/`_` are
/// dropped.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    cleaned.trim_matches(['.', '_']).to_string()
}
