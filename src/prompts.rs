use crate::models::{GreetingRequest, ImageRequest, Theme};

pub const SUGGESTIONS_SYSTEM: &str = include_str!("../data/prompts/suggestions_system.txt");
pub const SUGGESTIONS_USER: &str = include_str!("../data/prompts/suggestions_user.txt");
pub const SCENE_SYSTEM: &str = include_str!("../data/prompts/scene_system.txt");
pub const SCENE_USER: &str = include_str!("../data/prompts/scene_user.txt");
pub const IMAGE_PROMPT: &str = include_str!("../data/prompts/image_prompt.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// User instruction asking a text model for `count` greeting suggestions.
pub fn suggestions_user(request: &GreetingRequest, count: usize) -> String {
    let theme_guidance = match request.theme {
        Theme::Generico => "Fale de gratidão, amizade, natureza e bons sentimentos.",
        Theme::Cristao => "Inclua uma referência a Deus, à fé ou a uma bênção, com respeito.",
    };

    render(
        SUGGESTIONS_USER,
        &[
            ("count", &count.to_string()),
            ("message_type", request.message_type.as_str()),
            ("theme", request.theme.as_str()),
            ("theme_guidance", theme_guidance),
        ],
    )
}

/// User instruction asking a text model to turn a greeting into an English scene.
pub fn scene_user(request: &ImageRequest) -> String {
    render(
        SCENE_USER,
        &[
            ("message", request.message.trim()),
            ("message_type", request.message_type.as_str()),
            ("theme", request.theme.as_str()),
            ("time_hint", request.message_type.scene_hint()),
            ("theme_hint", request.theme.scene_hint()),
        ],
    )
}

/// Final prompt handed to the image model.
///
/// `scene` is either an enriched English description or the raw greeting.
pub fn image_prompt(scene: &str, request: &ImageRequest) -> String {
    render(
        IMAGE_PROMPT,
        &[
            ("scene", scene.trim()),
            ("style", request.image_style.art_direction()),
            ("time_hint", request.message_type.scene_hint()),
            ("theme_hint", request.theme.scene_hint()),
        ],
    )
}

/// Scene used when enrichment is disabled or fails.
pub fn fallback_scene(request: &ImageRequest) -> String {
    format!(
        "A greeting card illustration inspired by the message \"{}\"",
        request.message.trim()
    )
}
