use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assets::{GeneratedImage, ImageAsset};
use crate::catalog::{
    self, AgeGroup, AspectRatio, BeautifyLevel, ClothingLength, Gender, OptionEntry, OutputStyle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    LocationDomestic,
    LocationWorld,
    Pose,
    Outfit,
    Companion,
    AddOns,
    BeautifyOnly,
}

impl Feature {
    pub const ALL: &'static [Feature] = &[
        Feature::LocationDomestic,
        Feature::LocationWorld,
        Feature::Pose,
        Feature::Outfit,
        Feature::Companion,
        Feature::AddOns,
        Feature::BeautifyOnly,
    ];

    pub fn value(self) -> &'static str {
        match self {
            Feature::LocationDomestic => "location_domestic",
            Feature::LocationWorld => "location_world",
            Feature::Pose => "pose",
            Feature::Outfit => "outfit",
            Feature::Companion => "companion",
            Feature::AddOns => "add_ons",
            Feature::BeautifyOnly => "beautify_only",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.value() == value)
    }

    pub fn label(self) -> &'static str {
        catalog::label_for(catalog::FEATURES, self.value()).unwrap_or(self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomesticLocation {
    pub province: String,
    pub landmark: String,
    pub custom_landmark: String,
    pub style: String,
}

impl Default for DomesticLocation {
    fn default() -> Self {
        DomesticLocation {
            province: String::new(),
            landmark: String::new(),
            custom_landmark: String::new(),
            style: "realistic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldLocation {
    pub place: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outfit {
    pub description: String,
    pub length: ClothingLength,
    pub accessories: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionSource {
    Generated,
    Uploaded,
}

/// Only the attributes selected by `source` are read by the compiler.
#[derive(Debug, Clone)]
pub struct Companion {
    pub source: CompanionSource,
    pub image: Option<ImageAsset>,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub outfit: String,
    pub interaction: String,
}

impl Default for Companion {
    fn default() -> Self {
        Companion {
            source: CompanionSource::Generated,
            image: None,
            gender: Gender::Male,
            age_group: AgeGroup::YoungAdult,
            outfit: String::new(),
            interaction: "standing next to main character".to_string(),
        }
    }
}

impl Companion {
    pub fn uploaded_image(&self) -> Option<&ImageAsset> {
        match self.source {
            CompanionSource::Uploaded => self.image.as_ref(),
            CompanionSource::Generated => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterTraits {
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub expression: String,
    pub beautify: BeautifyLevel,
}

impl Default for CharacterTraits {
    fn default() -> Self {
        CharacterTraits {
            gender: Gender::Auto,
            age_group: AgeGroup::Auto,
            expression: "smiling_naturally".to_string(),
            beautify: BeautifyLevel::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Compiling,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image: GeneratedImage,
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    pub phase: SubmissionPhase,
    pub in_flight: bool,
    pub last_result: Option<GenerationResult>,
    pub last_error: Option<String>,
}

/// The named tag sets that share the generic toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetField {
    WeatherConditions,
    BackgroundDetails,
    Accessories,
}

impl SetField {
    pub fn catalog(self) -> &'static [OptionEntry] {
        match self {
            SetField::WeatherConditions => catalog::WEATHER,
            SetField::BackgroundDetails => catalog::BACKGROUND_DETAILS,
            SetField::Accessories => catalog::ACCESSORIES,
        }
    }

    fn get(self, state: &SelectionState) -> &BTreeSet<String> {
        match self {
            SetField::WeatherConditions => &state.weather_conditions,
            SetField::BackgroundDetails => &state.background_details,
            SetField::Accessories => &state.outfit.accessories,
        }
    }

    fn get_mut(self, state: &mut SelectionState) -> &mut BTreeSet<String> {
        match self {
            SetField::WeatherConditions => &mut state.weather_conditions,
            SetField::BackgroundDetails => &mut state.background_details,
            SetField::Accessories => &mut state.outfit.accessories,
        }
    }
}

/// Symmetric difference of `set` with `{item}`.
fn toggled<T: Ord + Clone>(set: &BTreeSet<T>, item: T) -> BTreeSet<T> {
    let single = BTreeSet::from([item]);
    set.symmetric_difference(&single).cloned().collect()
}

/// One editing session's choices. Every update returns a new snapshot.
#[derive(Debug, Clone)]
pub struct SelectionState {
    pub primary_image: Option<ImageAsset>,
    pub active_features: BTreeSet<Feature>,
    pub location_domestic: DomesticLocation,
    pub location_world: WorldLocation,
    pub outfit: Outfit,
    pub pose: String,
    pub companion: Companion,
    pub add_ons: String,
    pub background_details: BTreeSet<String>,
    pub weather_conditions: BTreeSet<String>,
    pub character: CharacterTraits,
    pub output_style: OutputStyle,
    pub aspect_ratio: AspectRatio,
    pub request_status: RequestStatus,
}

impl Default for SelectionState {
    fn default() -> Self {
        SelectionState {
            primary_image: None,
            active_features: BTreeSet::from([Feature::LocationDomestic]),
            location_domestic: DomesticLocation::default(),
            location_world: WorldLocation::default(),
            outfit: Outfit::default(),
            pose: String::new(),
            companion: Companion::default(),
            add_ons: String::new(),
            background_details: BTreeSet::new(),
            weather_conditions: BTreeSet::new(),
            character: CharacterTraits::default(),
            output_style: OutputStyle::Photorealistic,
            aspect_ratio: AspectRatio::Portrait9x16,
            request_status: RequestStatus::default(),
        }
    }
}

/// A shallow patch: each `Some` replaces the whole top-level slice.
#[derive(Debug, Clone, Default)]
pub struct SelectionPatch {
    pub primary_image: Option<ImageAsset>,
    pub active_features: Option<BTreeSet<Feature>>,
    pub location_domestic: Option<DomesticLocation>,
    pub location_world: Option<WorldLocation>,
    pub outfit: Option<Outfit>,
    pub pose: Option<String>,
    pub companion: Option<Companion>,
    pub add_ons: Option<String>,
    pub background_details: Option<BTreeSet<String>>,
    pub weather_conditions: Option<BTreeSet<String>>,
    pub character: Option<CharacterTraits>,
    pub output_style: Option<OutputStyle>,
    pub aspect_ratio: Option<AspectRatio>,
    pub request_status: Option<RequestStatus>,
}

impl SelectionState {
    /// A patched `primary_image` clears the last result like an upload does,
    /// unless the patch also carries its own `request_status`.
    pub fn apply_partial_update(&self, patch: SelectionPatch) -> SelectionState {
        let mut next = match patch.primary_image {
            Some(image) => self.with_primary_image(image),
            None => self.clone(),
        };
        if let Some(value) = patch.active_features {
            next.active_features = value;
        }
        if let Some(value) = patch.location_domestic {
            next.location_domestic = value;
        }
        if let Some(value) = patch.location_world {
            next.location_world = value;
        }
        if let Some(value) = patch.outfit {
            next.outfit = value;
        }
        if let Some(value) = patch.pose {
            next.pose = value;
        }
        if let Some(value) = patch.companion {
            next.companion = value;
        }
        if let Some(value) = patch.add_ons {
            next.add_ons = value;
        }
        if let Some(value) = patch.background_details {
            next.background_details = value;
        }
        if let Some(value) = patch.weather_conditions {
            next.weather_conditions = value;
        }
        if let Some(value) = patch.character {
            next.character = value;
        }
        if let Some(value) = patch.output_style {
            next.output_style = value;
        }
        if let Some(value) = patch.aspect_ratio {
            next.aspect_ratio = value;
        }
        if let Some(value) = patch.request_status {
            next.request_status = value;
        }
        next
    }

    pub fn is_active(&self, feature: Feature) -> bool {
        self.active_features.contains(&feature)
    }

    pub fn toggle_feature(&self, feature: Feature) -> SelectionState {
        let mut next = self.clone();
        next.active_features = toggled(&self.active_features, feature);
        next
    }

    /// Unknown ids are never added; removing is always allowed.
    pub fn toggle_set_member(&self, field: SetField, item: &str) -> SelectionState {
        let current = field.get(self);
        if !current.contains(item) && catalog::find_entry(field.catalog(), item).is_none() {
            warn!(field = ?field, item = item, "Ignoring unknown catalog id");
            return self.clone();
        }

        let mut next = self.clone();
        *field.get_mut(&mut next) = toggled(current, item.to_string());
        next
    }

    /// A new source photo invalidates the previous result.
    pub fn with_primary_image(&self, image: ImageAsset) -> SelectionState {
        let mut next = self.clone();
        next.primary_image = Some(image);
        next.request_status.last_result = None;
        next
    }

    /// Changing the province always resets the landmark.
    pub fn with_province(&self, province: &str) -> SelectionState {
        let province = province.trim();
        if !province.is_empty() && !catalog::is_known_province(province) {
            warn!(province = province, "Ignoring unknown province");
            return self.clone();
        }

        let mut next = self.clone();
        next.location_domestic.province = province.to_string();
        next.location_domestic.landmark.clear();
        next
    }

    pub fn with_landmark(&self, landmark: &str) -> SelectionState {
        let location = &self.location_domestic;
        if !landmark.is_empty() {
            if location.province.is_empty() {
                warn!(landmark = landmark, "Landmark selected before a province");
                return self.clone();
            }
            if !catalog::is_landmark_of(&location.province, landmark) {
                warn!(
                    province = %location.province,
                    landmark = landmark,
                    "Landmark does not belong to the selected province"
                );
                return self.clone();
            }
        }

        let mut next = self.clone();
        next.location_domestic.landmark = landmark.to_string();
        next.location_domestic.custom_landmark.clear();
        next
    }

    pub fn with_custom_landmark(&self, text: &str) -> SelectionState {
        let mut next = self.clone();
        next.location_domestic.custom_landmark = text.to_string();
        next.location_domestic.landmark.clear();
        next
    }

    pub fn with_location_style(&self, style: &str) -> SelectionState {
        if catalog::find_entry(catalog::LOCATION_STYLES, style).is_none() {
            warn!(style = style, "Ignoring unknown location style");
            return self.clone();
        }
        let mut next = self.clone();
        next.location_domestic.style = style.to_string();
        next
    }

    pub fn with_expression(&self, expression: &str) -> SelectionState {
        if catalog::find_entry(catalog::EXPRESSIONS, expression).is_none() {
            warn!(expression = expression, "Ignoring unknown expression");
            return self.clone();
        }
        let mut next = self.clone();
        next.character.expression = expression.to_string();
        next
    }

    pub fn with_pose_suggestion(&self, index: usize) -> SelectionState {
        let Some(suggestion) = catalog::POSE_SUGGESTIONS.get(index) else {
            warn!(index = index, "Pose suggestion index out of range");
            return self.clone();
        };
        let mut next = self.clone();
        next.pose = suggestion.to_string();
        next
    }

    pub fn with_world_suggestions(&self, suggestions: Vec<String>) -> SelectionState {
        let mut next = self.clone();
        next.location_world.suggestions = suggestions;
        next
    }

    pub fn with_world_suggestion_chosen(&self, index: usize) -> SelectionState {
        let Some(choice) = self.location_world.suggestions.get(index) else {
            warn!(index = index, "World suggestion index out of range");
            return self.clone();
        };
        let mut next = self.clone();
        next.location_world.place = choice.clone();
        next
    }

    pub fn with_companion_source(&self, source: CompanionSource) -> SelectionState {
        let mut next = self.clone();
        next.companion.source = source;
        next
    }

    /// The superseded companion preview is released with the old snapshot.
    pub fn with_companion_image(&self, image: ImageAsset) -> SelectionState {
        let mut next = self.clone();
        next.companion.image = Some(image);
        next
    }

    /// Starts a new cycle. The last good result stays visible.
    pub fn with_submission_started(&self) -> SelectionState {
        let mut next = self.clone();
        next.request_status.phase = SubmissionPhase::Compiling;
        next.request_status.in_flight = true;
        next.request_status.last_error = None;
        next
    }

    pub fn with_phase(&self, phase: SubmissionPhase) -> SelectionState {
        let mut next = self.clone();
        next.request_status.phase = phase;
        next
    }

    pub fn with_submission_succeeded(&self, result: GenerationResult) -> SelectionState {
        let mut next = self.clone();
        next.request_status.phase = SubmissionPhase::Succeeded;
        next.request_status.last_result = Some(result);
        next.request_status.last_error = None;
        next
    }

    pub fn with_submission_failed(&self, message: impl Into<String>) -> SelectionState {
        let mut next = self.clone();
        next.request_status.phase = SubmissionPhase::Failed;
        next.request_status.last_error = Some(message.into());
        next
    }

    pub fn with_in_flight_cleared(&self) -> SelectionState {
        let mut next = self.clone();
        next.request_status.in_flight = false;
        next
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::testing::{png_asset, previewed_asset, RecordingRevoker};

    #[test]
    fn defaults_match_session_start() {
        let state = SelectionState::default();
        assert_eq!(
            state.active_features,
            BTreeSet::from([Feature::LocationDomestic])
        );
        assert_eq!(state.character.expression, "smiling_naturally");
        assert_eq!(state.character.beautify, BeautifyLevel::Light);
        assert_eq!(state.location_domestic.style, "realistic");
        assert_eq!(state.companion.source, CompanionSource::Generated);
        assert_eq!(state.aspect_ratio, AspectRatio::Portrait9x16);
        assert_eq!(state.output_style, OutputStyle::Photorealistic);
        assert!(!state.request_status.in_flight);
    }

    #[test]
    fn partial_update_replaces_only_patched_slices() {
        let state = SelectionState::default();
        let next = state.apply_partial_update(SelectionPatch {
            pose: Some("Ngồi thư giãn".to_string()),
            aspect_ratio: Some(AspectRatio::Square),
            ..SelectionPatch::default()
        });
        assert_eq!(next.pose, "Ngồi thư giãn");
        assert_eq!(next.aspect_ratio, AspectRatio::Square);
        assert_eq!(next.active_features, state.active_features);
        assert_eq!(state.pose, "");
    }

    #[test]
    fn toggle_feature_is_symmetric() {
        let state = SelectionState::default();
        let with_pose = state.toggle_feature(Feature::Pose);
        assert!(with_pose.is_active(Feature::Pose));
        let without_pose = with_pose.toggle_feature(Feature::Pose);
        assert_eq!(without_pose.active_features, state.active_features);
        let none = state.toggle_feature(Feature::LocationDomestic);
        assert!(none.active_features.is_empty());
    }

    #[test]
    fn toggle_set_member_works_for_every_field() {
        let cases = [
            (SetField::WeatherConditions, "rainy"),
            (SetField::BackgroundDetails, "lanterns"),
            (SetField::Accessories, "hat"),
        ];
        for (field, id) in cases {
            let state = SelectionState::default();
            let added = state.toggle_set_member(field, id);
            assert!(field.get(&added).contains(id));
            let removed = added.toggle_set_member(field, id);
            assert!(field.get(&removed).is_empty());
        }
    }

    #[test]
    fn toggle_set_member_ignores_unknown_ids() {
        let state = SelectionState::default();
        let next = state.toggle_set_member(SetField::WeatherConditions, "volcanic");
        assert!(next.weather_conditions.is_empty());
        let next = state.toggle_set_member(SetField::Accessories, "rainy");
        assert!(next.outfit.accessories.is_empty());
    }

    #[test]
    fn changing_province_resets_landmark() {
        let state = SelectionState::default()
            .with_province("Lâm Đồng")
            .with_landmark("Hồ Xuân Hương");
        assert_eq!(state.location_domestic.landmark, "Hồ Xuân Hương");

        let moved = state.with_province("Hà Nội");
        assert_eq!(moved.location_domestic.province, "Hà Nội");
        assert!(moved.location_domestic.landmark.is_empty());
    }

    #[test]
    fn landmark_requires_a_matching_province() {
        let state = SelectionState::default().with_landmark("Hồ Xuân Hương");
        assert!(state.location_domestic.landmark.is_empty());

        let state = SelectionState::default()
            .with_province("Hà Nội")
            .with_landmark("Hồ Xuân Hương");
        assert!(state.location_domestic.landmark.is_empty());
    }

    #[test]
    fn unknown_province_is_ignored() {
        let state = SelectionState::default().with_province("Atlantis");
        assert!(state.location_domestic.province.is_empty());
    }

    #[test]
    fn custom_landmark_and_catalog_landmark_exclude_each_other() {
        let state = SelectionState::default()
            .with_province("Lâm Đồng")
            .with_landmark("Hồ Xuân Hương")
            .with_custom_landmark("Quán cà phê Tùng");
        assert!(state.location_domestic.landmark.is_empty());
        assert_eq!(state.location_domestic.custom_landmark, "Quán cà phê Tùng");

        let state = state.with_landmark("Núi Langbiang");
        assert!(state.location_domestic.custom_landmark.is_empty());
        assert_eq!(state.location_domestic.landmark, "Núi Langbiang");
    }

    #[test]
    fn new_primary_image_clears_result_and_releases_old_preview() {
        let revoker = Arc::new(RecordingRevoker::default());
        let mut state = SelectionState::default().with_primary_image(previewed_asset("blob:a", &revoker));
        state.request_status.last_result = Some(GenerationResult {
            image: GeneratedImage {
                mime_type: "image/png".to_string(),
                bytes: vec![1],
            },
            caption: "done".to_string(),
        });

        state = state.with_primary_image(previewed_asset("blob:b", &revoker));
        assert!(state.request_status.last_result.is_none());
        assert_eq!(revoker.revoked(), vec!["blob:a".to_string()]);
        assert_eq!(
            state.primary_image.as_ref().and_then(ImageAsset::preview),
            Some("blob:b")
        );
    }

    #[test]
    fn replacing_companion_image_releases_old_preview() {
        let revoker = Arc::new(RecordingRevoker::default());
        let mut state = SelectionState::default()
            .with_companion_source(CompanionSource::Uploaded)
            .with_companion_image(previewed_asset("blob:first", &revoker));
        state = state.with_companion_image(previewed_asset("blob:second", &revoker));
        assert_eq!(revoker.revoked(), vec!["blob:first".to_string()]);

        state = state.apply_partial_update(SelectionPatch {
            companion: Some(Companion::default()),
            ..SelectionPatch::default()
        });
        assert_eq!(
            revoker.revoked(),
            vec!["blob:first".to_string(), "blob:second".to_string()]
        );
        assert!(state.companion.image.is_none());
    }

    #[test]
    fn companion_image_is_only_active_when_uploaded() {
        let state = SelectionState::default().with_companion_image(png_asset());
        assert!(state.companion.uploaded_image().is_none());
        let state = state.with_companion_source(CompanionSource::Uploaded);
        assert!(state.companion.uploaded_image().is_some());
    }

    #[test]
    fn suggestions_can_be_chosen_by_index() {
        let state = SelectionState::default()
            .with_world_suggestions(vec!["Tháp Eiffel, Pháp".to_string()])
            .with_world_suggestion_chosen(0);
        assert_eq!(state.location_world.place, "Tháp Eiffel, Pháp");
        let unchanged = state.with_world_suggestion_chosen(5);
        assert_eq!(unchanged.location_world.place, "Tháp Eiffel, Pháp");
    }

    #[test]
    fn pose_suggestion_prefills_pose() {
        let state = SelectionState::default().with_pose_suggestion(5);
        assert_eq!(state.pose, "Cầm ly cà phê");
        assert_eq!(state.with_pose_suggestion(99).pose, "Cầm ly cà phê");
    }

    #[test]
    fn expression_and_style_must_exist_in_catalog() {
        let state = SelectionState::default()
            .with_expression("winking")
            .with_location_style("sunset");
        assert_eq!(state.character.expression, "winking");
        assert_eq!(state.location_domestic.style, "sunset");

        let state = state.with_expression("angry").with_location_style("noir");
        assert_eq!(state.character.expression, "winking");
        assert_eq!(state.location_domestic.style, "sunset");
    }

    #[test]
    fn patching_the_primary_image_clears_the_last_result() {
        let result = GenerationResult {
            image: GeneratedImage {
                mime_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            },
            caption: "ok".to_string(),
        };
        let state = SelectionState::default()
            .with_primary_image(png_asset())
            .with_submission_succeeded(result);

        let unrelated = state.apply_partial_update(SelectionPatch {
            pose: Some("Nhìn xa xăm".to_string()),
            ..SelectionPatch::default()
        });
        assert!(unrelated.request_status.last_result.is_some());

        let reuploaded = state.apply_partial_update(SelectionPatch {
            primary_image: Some(png_asset()),
            ..SelectionPatch::default()
        });
        assert!(reuploaded.request_status.last_result.is_none());
        assert_eq!(
            reuploaded.request_status.phase,
            SubmissionPhase::Succeeded
        );
    }

    #[test]
    fn failure_keeps_the_last_good_result() {
        let result = GenerationResult {
            image: GeneratedImage {
                mime_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            },
            caption: "ok".to_string(),
        };
        let succeeded = SelectionState::default()
            .with_submission_started()
            .with_submission_succeeded(result.clone())
            .with_in_flight_cleared();
        assert_eq!(succeeded.request_status.phase, SubmissionPhase::Succeeded);

        let failed = succeeded
            .with_submission_started()
            .with_submission_failed("boom")
            .with_in_flight_cleared();
        assert_eq!(failed.request_status.phase, SubmissionPhase::Failed);
        assert_eq!(failed.request_status.last_result, Some(result));
        assert_eq!(failed.request_status.last_error.as_deref(), Some("boom"));
        assert!(!failed.request_status.in_flight);

        let restarted = failed.with_submission_started();
        assert!(restarted.request_status.last_error.is_none());
        assert!(restarted.request_status.in_flight);
    }
}
