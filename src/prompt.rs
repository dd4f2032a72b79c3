use tracing::{debug, warn};

use crate::assets::ImageAsset;
use crate::catalog::{self, AgeGroup, AspectBucket, BeautifyLevel, Gender};
use crate::error::StudioError;
use crate::selection::{CompanionSource, Feature, SelectionState};

pub const IDENTITY_DIRECTIVE: &str = "CORE REQUIREMENT: Keep the face and identity of the person in the first image exactly as in the original photo. Do not change their facial structure, eyes, nose, mouth or skin tone.";

const TASK_LINE: &str = "TASK: Professional travel photo edit of the person in the first image.";

const FALLBACK_LANDMARK: &str = "a famous landmark";
const FALLBACK_OUTFIT: &str = "elegant travel fashion";
const FALLBACK_COMPANION_OUTFIT: &str = "an outfit that matches the scene";

const BEAUTIFY_OFF: &str = "Skin retouching: none. Keep the natural skin texture exactly as in the original photo.";
const BEAUTIFY_LIGHT: &str = "Skin retouching: light. Slightly even out the skin tone and soften small blemishes while keeping the natural skin texture.";
const BEAUTIFY_MEDIUM: &str = "Skin retouching: medium. Smooth the skin, reduce blemishes and dark circles and brighten the complexion, keeping the result realistic.";
const BEAUTIFY_HIGH: &str = "Skin retouching: high. Apply magazine-grade retouching with smooth, radiant skin and bright eyes, without altering the person's identity.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    /// Base64 encoded bytes.
    pub data: String,
}

impl ImagePart {
    pub fn from_asset(asset: &ImageAsset) -> Self {
        ImagePart {
            mime_type: asset.mime_type().to_string(),
            data: asset.to_base64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt {
    pub instruction_text: String,
    /// Primary image first, companion image (if any) second.
    pub image_parts: Vec<ImagePart>,
}

/// Advisory hints for the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechnicalHints {
    pub aspect_bucket: AspectBucket,
}

impl TechnicalHints {
    pub fn from_state(state: &SelectionState) -> Self {
        let ratio = state.aspect_ratio;
        let aspect_bucket = ratio.bucket();
        if ratio.is_degraded() {
            debug!(
                requested = ratio.value(),
                sent = aspect_bucket.value(),
                "Aspect ratio reduced to a supported provider bucket"
            );
        }
        TechnicalHints { aspect_bucket }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub text: String,
    pub attachment: Option<ImagePart>,
}

impl Clause {
    fn text(text: String) -> Self {
        Clause {
            text,
            attachment: None,
        }
    }
}

pub type ClauseBuilder = fn(&SelectionState) -> Option<Clause>;

pub const FEATURE_CLAUSES: &[(Feature, ClauseBuilder)] = &[
    (Feature::LocationDomestic, domestic_location_clause as ClauseBuilder),
    (Feature::LocationWorld, world_location_clause as ClauseBuilder),
    (Feature::Outfit, outfit_clause as ClauseBuilder),
    (Feature::Pose, pose_clause as ClauseBuilder),
    (Feature::AddOns, add_ons_clause as ClauseBuilder),
    (Feature::Companion, companion_clause as ClauseBuilder),
];

pub const ALWAYS_CLAUSES: &[ClauseBuilder] = &[
    weather_clause,
    background_clause,
    character_clause,
    beautify_clause,
    technical_clause,
];

pub fn compile(state: &SelectionState) -> Result<CompiledPrompt, StudioError> {
    let primary = state
        .primary_image
        .as_ref()
        .ok_or(StudioError::MissingPrimaryImage)?;

    let mut lines = vec![IDENTITY_DIRECTIVE.to_string(), TASK_LINE.to_string()];
    let mut image_parts = vec![ImagePart::from_asset(primary)];

    let feature_clauses = FEATURE_CLAUSES
        .iter()
        .filter(|(feature, _)| state.is_active(*feature))
        .filter_map(|(_, build)| build(state));
    let always_clauses = ALWAYS_CLAUSES.iter().filter_map(|build| build(state));

    for clause in feature_clauses.chain(always_clauses) {
        lines.push(clause.text);
        if let Some(part) = clause.attachment {
            image_parts.push(part);
        }
    }

    Ok(CompiledPrompt {
        instruction_text: lines.join("\n"),
        image_parts,
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn domestic_location_clause(state: &SelectionState) -> Option<Clause> {
    let location = &state.location_domestic;
    let place = non_empty(&location.custom_landmark)
        .or_else(|| non_empty(&location.landmark))
        .unwrap_or(FALLBACK_LANDMARK);
    let region = match non_empty(&location.province) {
        Some(province) => format!("{province} province, Vietnam"),
        None => "Vietnam".to_string(),
    };
    Some(Clause::text(format!(
        "Location: place the person in a travel scene at {place}, {region}. Scene style: {}.",
        location.style
    )))
}

pub fn world_location_clause(state: &SelectionState) -> Option<Clause> {
    Some(Clause::text(format!(
        "World location: place the person in a travel scene at {}.",
        state.location_world.place
    )))
}

pub fn outfit_clause(state: &SelectionState) -> Option<Clause> {
    let outfit = &state.outfit;
    let description = non_empty(&outfit.description).unwrap_or(FALLBACK_OUTFIT);
    let mut text = format!(
        "Outfit: change the clothing to {description}. Clothing length: {}.",
        outfit.length.label()
    );
    let accessories = catalog::labels_in_catalog_order(catalog::ACCESSORIES, &outfit.accessories);
    if !accessories.is_empty() {
        text.push_str(&format!(" Accessories: {}.", accessories.join(", ")));
    }
    Some(Clause::text(text))
}

pub fn pose_clause(state: &SelectionState) -> Option<Clause> {
    Some(Clause::text(format!(
        "Pose: change the person's pose to: {}.",
        state.pose
    )))
}

pub fn add_ons_clause(state: &SelectionState) -> Option<Clause> {
    Some(Clause::text(format!(
        "Add-ons: add the following objects to the photo: {}.",
        state.add_ons
    )))
}

fn person_descriptors(gender: Gender, age_group: AgeGroup) -> Vec<String> {
    let mut descriptors = Vec::new();
    if gender != Gender::Auto {
        descriptors.push(format!("gender {}", gender.label()));
    }
    if age_group != AgeGroup::Auto {
        descriptors.push(format!("age group {}", age_group.label()));
    }
    descriptors
}

pub fn companion_clause(state: &SelectionState) -> Option<Clause> {
    let companion = &state.companion;
    let interaction = companion.interaction.trim();

    if let Some(image) = companion.uploaded_image() {
        let mut text = format!(
            "Companion: add the person from the second image into the scene beside the main subject, keeping that person's face and identity. Interaction: {interaction}."
        );
        if let Some(outfit) = non_empty(&companion.outfit) {
            text.push_str(&format!(" Companion outfit: {outfit}."));
        }
        return Some(Clause {
            text,
            attachment: Some(ImagePart::from_asset(image)),
        });
    }

    if companion.source == CompanionSource::Uploaded {
        warn!("Companion source is uploaded but no image is set; describing a generated companion");
    }

    let mut descriptors = person_descriptors(companion.gender, companion.age_group);
    descriptors.push(format!(
        "wearing {}",
        non_empty(&companion.outfit).unwrap_or(FALLBACK_COMPANION_OUTFIT)
    ));
    Some(Clause::text(format!(
        "Companion: add a second person ({}). Interaction: {interaction}.",
        descriptors.join(", ")
    )))
}

pub fn weather_clause(state: &SelectionState) -> Option<Clause> {
    let labels = catalog::labels_in_catalog_order(catalog::WEATHER, &state.weather_conditions);
    if labels.is_empty() {
        return None;
    }
    Some(Clause::text(format!("Weather: {}.", labels.join(", "))))
}

pub fn background_clause(state: &SelectionState) -> Option<Clause> {
    let labels =
        catalog::labels_in_catalog_order(catalog::BACKGROUND_DETAILS, &state.background_details);
    if labels.is_empty() {
        return None;
    }
    Some(Clause::text(format!(
        "Background details: {}.",
        labels.join(", ")
    )))
}

pub fn character_clause(state: &SelectionState) -> Option<Clause> {
    let character = &state.character;
    let mut descriptors = person_descriptors(character.gender, character.age_group);
    let expression = catalog::label_for(catalog::EXPRESSIONS, &character.expression)
        .unwrap_or(character.expression.as_str());
    descriptors.push(format!("facial expression {expression}"));
    Some(Clause::text(format!(
        "Character: {}.",
        descriptors.join("; ")
    )))
}

pub fn beautify_instruction(level: BeautifyLevel) -> &'static str {
    match level {
        BeautifyLevel::Off => BEAUTIFY_OFF,
        BeautifyLevel::Light => BEAUTIFY_LIGHT,
        BeautifyLevel::Medium => BEAUTIFY_MEDIUM,
        BeautifyLevel::High => BEAUTIFY_HIGH,
    }
}

pub fn beautify_clause(state: &SelectionState) -> Option<Clause> {
    Some(Clause::text(
        beautify_instruction(state.character.beautify).to_string(),
    ))
}

pub fn technical_clause(state: &SelectionState) -> Option<Clause> {
    Some(Clause::text(format!(
        "Technical parameters: art style {} ({}); aspect ratio {}; quality 8K, photorealistic detail.",
        state.output_style.label(),
        state.output_style.value(),
        state.aspect_ratio.value()
    )))
}
