//! Advisory template engine
//!
//! Turns a predicted label and a field record into a short farmer-facing
//! message. The growth stage drives fertilizer and weed-control wording and
//! the closing hint. Output is held between [`MIN_WORDS`] and [`MAX_WORDS`]
//! words and wrapped to [`WRAP_WIDTH`] columns.

use crate::models::{crop_stage, AdvisoryIntent, CropStage, FeatureRecord};

/// Column width of the wrapped advisory
pub const WRAP_WIDTH: usize = 80;

/// Messages longer than this are truncated
pub const MAX_WORDS: usize = 55;

/// Word count kept when a message is truncated
pub const TRUNCATED_WORDS: usize = 50;

/// Messages shorter than this are padded
pub const MIN_WORDS: usize = 30;

/// Appended to messages below [`MIN_WORDS`]
pub const PADDING: &str = "Keep observing the field daily for any change.";

/// Values substituted into message templates
struct TemplateContext<'a> {
    farmer: String,
    crop: String,
    location: String,
    soil: &'a str,
    weather: &'a str,
    temperature: f64,
    humidity: f64,
    rainfall: f64,
    stage: CropStage,
}

/// Capitalize the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

fn fertilizer_advice(stage: CropStage, crop: &str, soil: &str) -> String {
    match stage {
        CropStage::Seedling => format!(
            "This stage needs Phosphorus (P) for root growth. Use a starter fertilizer (e.g., high-P, low-N) suitable for {soil} soil."
        ),
        CropStage::Vegetative => "The crop is in active growth. Apply a high-Nitrogen (N) fertilizer to support leaf and stem development.".to_string(),
        CropStage::Flowering => "Shift nutrient focus. The crop needs more Phosphorus (P) and Potassium (K) to support flower and fruit set. Reduce Nitrogen.".to_string(),
        CropStage::Maturity => "Nutrient requirements are low. No major fertilizer application is needed. Focus on harvest preparation.".to_string(),
        CropStage::Unknown => format!(
            "Apply a balanced fertilizer (e.g., NPK 10-10-10) suitable for {soil} soil and your {crop}."
        ),
    }
}

fn weed_control_advice(stage: CropStage, crop: &str) -> String {
    match stage {
        CropStage::Seedling => format!(
            "This is a CRITICAL period. Young plants cannot compete with weeds. Use manual weeding or a recommended pre-emergence herbicide for {crop}."
        ),
        CropStage::Vegetative => "Weeds are still a major threat. Monitor and apply a post-emergence herbicide if needed, before the crop canopy closes.".to_string(),
        CropStage::Flowering => "Weed competition is less critical, but remove large weeds that block sunlight or moisture.".to_string(),
        CropStage::Maturity => "Weed control is not usually needed now; focus on harvest preparation.".to_string(),
        CropStage::Unknown => format!(
            "Maintain regular weed monitoring and control practices for your {crop}."
        ),
    }
}

fn stage_hint(stage: CropStage) -> Option<&'static str> {
    match stage {
        CropStage::Seedling => Some("Avoid overwatering and protect young plants."),
        CropStage::Vegetative => Some("Ensure proper irrigation for vigorous growth."),
        CropStage::Flowering => Some("Maintain consistent moisture and check for pollination success."),
        CropStage::Maturity => Some("Reduce irrigation and prepare for harvest."),
        CropStage::Unknown => None,
    }
}

/// Equally valid phrasings for an intent
fn message_variants(intent: AdvisoryIntent, ctx: &TemplateContext<'_>) -> Vec<String> {
    let TemplateContext {
        farmer,
        crop,
        location,
        soil,
        weather,
        temperature: temp,
        humidity: hum,
        rainfall: rain,
        stage,
    } = ctx;

    match intent {
        AdvisoryIntent::IrrigationNeeded => vec![
            format!(
                "Hello {farmer}, your {crop} field in {location} shows low moisture under {weather} weather. \
                 At {temp}°C and {hum}% humidity, irrigation is required for healthy growth."
            ),
            format!(
                "Hello {farmer}, the soil in your {crop} field at {location} is drying out. \
                 With {weather} weather, {temp}°C and {hum}% humidity, give the crop a thorough irrigation soon."
            ),
        ],
        AdvisoryIntent::ReduceIrrigation => vec![
            format!(
                "Hello {farmer}, your {crop} field in {location} has sufficient moisture after {rain}mm rainfall. \
                 You can reduce irrigation temporarily."
            ),
            format!(
                "Hello {farmer}, {rain}mm of rain has left enough water in your {crop} field at {location}. \
                 Hold back on irrigation until the topsoil dries."
            ),
        ],
        AdvisoryIntent::Fertilizer => {
            let advice = fertilizer_advice(*stage, crop, soil);
            vec![
                format!(
                    "Hello {farmer}, your {crop} crop is in the {stage} stage. {advice} \
                     Conditions ({temp}°C, {hum}% humidity) are suitable for fertilizer application."
                ),
                format!(
                    "Hello {farmer}, at the {stage} stage your {crop} in {location} needs attention to nutrition. {advice} \
                     Current conditions ({temp}°C, {hum}% humidity) allow fertilizer application."
                ),
            ]
        }
        AdvisoryIntent::PestMonitor => vec![
            format!(
                "Hello {farmer}, warm and humid conditions ({temp}°C, {hum}% humidity) can attract pests in your {crop} field. \
                 Inspect plants daily and use eco-friendly pest control methods."
            ),
            format!(
                "Hello {farmer}, pests thrive at {temp}°C and {hum}% humidity, so check your {crop} field in {location} closely. \
                 Look under leaves and prefer eco-friendly pest control."
            ),
        ],
        AdvisoryIntent::WeedControl => {
            let advice = weed_control_advice(*stage, crop);
            vec![
                format!("Hello {farmer}, your {crop} in {location} is at the {stage} stage. {advice}"),
                format!("Hello {farmer}, weeds compete with your {crop} in {location} during the {stage} stage. {advice}"),
            ]
        }
        AdvisoryIntent::NormalMonitor => vec![
            format!(
                "Hello {farmer}, conditions are stable for your {crop} in {location}. \
                 Continue regular monitoring and irrigation as needed."
            ),
            format!(
                "Hello {farmer}, your {crop} field in {location} looks steady today. \
                 Keep up routine checks and water only when the topsoil feels dry."
            ),
        ],
    }
}

/// Number of phrasings available for a label
pub fn variant_count(label: &str) -> usize {
    let record = FeatureRecord::new("", "", "");
    let ctx = template_context(&record);
    message_variants(AdvisoryIntent::from_label(label), &ctx).len()
}

fn template_context(record: &FeatureRecord) -> TemplateContext<'_> {
    let farmer = if record.farmer_name.trim().is_empty() {
        "Farmer".to_string()
    } else {
        capitalize(&record.farmer_name)
    };
    let crop = if record.crop_name.trim().is_empty() {
        "your crop".to_string()
    } else {
        record.crop_name.to_lowercase()
    };
    let location = if record.location.trim().is_empty() {
        "your area".to_string()
    } else {
        capitalize(&record.location)
    };

    TemplateContext {
        farmer,
        crop,
        location,
        soil: &record.soiltype,
        weather: &record.weather,
        temperature: record.temperature,
        humidity: record.humidity,
        rainfall: record.rainfall,
        stage: crop_stage(record.days_since_planting, record.resolved_lifecycle_days()),
    }
}

/// Apply the word budget: truncate long messages, pad short ones
pub fn enforce_word_budget(paragraph: &str) -> String {
    let mut words: Vec<&str> = paragraph.split_whitespace().collect();
    if words.len() > MAX_WORDS {
        words.truncate(TRUNCATED_WORDS);
    } else if words.len() < MIN_WORDS {
        words.extend(PADDING.split_whitespace());
    }
    words.join(" ")
}

/// Greedy word wrap; words longer than `width` sit on their own line
pub fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Build the advisory text for a label.
///
/// `variant` selects among equally valid phrasings and wraps around, so
/// callers can pass any random index.
pub fn build_advisory(label: &str, record: &FeatureRecord, variant: usize) -> String {
    let intent = AdvisoryIntent::from_label(label);
    let ctx = template_context(record);

    let variants = message_variants(intent, &ctx);
    let base = &variants[variant % variants.len()];

    let hint = if intent.embeds_stage_guidance() {
        None
    } else {
        stage_hint(ctx.stage)
    };
    let paragraph = match hint {
        Some(hint) => format!("{base} {hint}"),
        None => base.clone(),
    };

    wrap(&enforce_word_budget(&paragraph), WRAP_WIDTH)
}

/// One-line summary of rainfall, temperature and humidity conditions
pub fn weather_summary(record: &FeatureRecord) -> String {
    let rain = record.rainfall;
    let temp = record.temperature;
    let hum = record.humidity;

    let irrigation = if rain == 0.0 {
        "No rainfall, irrigate lightly.".to_string()
    } else if rain < 30.0 {
        format!("Low rainfall ({rain}mm), maintain watering.")
    } else {
        format!("Sufficient rainfall ({rain}mm), reduce irrigation.")
    };
    let temperature = if temp > 35.0 {
        format!("High temperature ({temp}°C), use mulch.")
    } else if temp < 20.0 {
        format!("Cool temperature ({temp}°C), ensure sunlight.")
    } else {
        format!("Temperature ({temp}°C) is suitable.")
    };
    let humidity = if hum < 40.0 {
        format!("Low humidity ({hum}%), monitor dryness.")
    } else if hum > 80.0 {
        format!("High humidity ({hum}%), check for fungus.")
    } else {
        format!("Humidity ({hum}%) is ideal.")
    };

    format!("{irrigation} {temperature} {humidity}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn minimal_record() -> FeatureRecord {
        FeatureRecord::new("maize", "delta", "loamy")
    }

    #[test]
    fn test_short_message_is_padded() {
        for variant in 0..variant_count("normal_monitor") {
            let advisory = build_advisory("normal_monitor", &minimal_record(), variant);
            let words = word_count(&advisory);
            assert!((MIN_WORDS..=TRUNCATED_WORDS).contains(&words), "{words} words");
            assert!(advisory.replace('\n', " ").ends_with(PADDING));
        }
    }

    #[test]
    fn test_long_message_is_truncated_to_fifty_words() {
        let mut record = minimal_record();
        record.location = vec!["riverside"; 45].join(" ");
        record.crop_name = "pearl millet of the northern hill terraces".into();

        let advisory = build_advisory("normal_monitor", &record, 0);
        assert_eq!(word_count(&advisory), TRUNCATED_WORDS);
        assert!(advisory.starts_with("Hello Farmer, conditions are stable"));
    }

    #[test]
    fn test_hint_appended_for_regular_labels() {
        let advisory = build_advisory("pest_monitor", &minimal_record(), 0);
        assert!(advisory
            .replace('\n', " ")
            .contains("Avoid overwatering and protect young plants."));
    }

    #[test]
    fn test_fertilizer_uses_stage_advice_without_hint() {
        let mut record = minimal_record();
        record.days_since_planting = 40; // maize: 40/100 = vegetative

        let advisory = build_advisory("fertilizer", &record, 0).replace('\n', " ");
        assert!(advisory.contains("vegetative stage"));
        assert!(advisory.contains("high-Nitrogen"));
        assert!(!advisory.contains("Ensure proper irrigation for vigorous growth."));
    }

    #[test]
    fn test_weed_control_substitutes_crop() {
        let advisory = build_advisory("weed_control", &minimal_record(), 0).replace('\n', " ");
        assert!(advisory.contains("pre-emergence herbicide for maize."));
    }

    #[test]
    fn test_unknown_label_uses_normal_monitor() {
        let healthy = build_advisory("healthy", &minimal_record(), 0);
        let normal = build_advisory("normal_monitor", &minimal_record(), 0);
        assert_eq!(healthy, normal);
    }

    #[test]
    fn test_variant_index_wraps() {
        let count = variant_count("irrigation_needed");
        assert_eq!(
            build_advisory("irrigation_needed", &minimal_record(), 0),
            build_advisory("irrigation_needed", &minimal_record(), count)
        );
    }

    #[test]
    fn test_output_is_wrapped() {
        let advisory = build_advisory("irrigation_needed", &minimal_record(), 0);
        assert!(advisory.lines().count() > 1);
        assert!(advisory.lines().all(|line| line.chars().count() <= WRAP_WIDTH));
    }

    #[test]
    fn test_wrap_keeps_long_words() {
        let long = "x".repeat(100);
        let wrapped = wrap(&format!("a {long} b"), 10);
        assert_eq!(wrapped, format!("a\n{long}\nb"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("sUDIP"), "Sudip");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_weather_summary_thresholds() {
        let mut record = minimal_record();
        record.temperature = 38.0;
        record.humidity = 85.0;
        record.rainfall = 0.0;
        let summary = weather_summary(&record);
        assert!(summary.contains("No rainfall"));
        assert!(summary.contains("use mulch"));
        assert!(summary.contains("check for fungus"));

        record.temperature = 25.0;
        record.humidity = 60.0;
        record.rainfall = 45.0;
        let summary = weather_summary(&record);
        assert!(summary.contains("Sufficient rainfall (45mm)"));
        assert!(summary.contains("Temperature (25°C) is suitable."));
        assert!(summary.contains("Humidity (60%) is ideal."));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The word budget never lets a message exceed the upper bound
        #[test]
        fn prop_word_budget_upper_bound(
            location in "[a-z]{1,12}( [a-z]{1,12}){0,60}",
            days in 0u32..400,
            variant in 0usize..8,
            label in prop::sample::select(vec![
                "irrigation_needed", "reduce_irrigation", "fertilizer",
                "pest_monitor", "weed_control", "normal_monitor", "stress",
            ]),
        ) {
            let mut record = minimal_record();
            record.location = location;
            record.days_since_planting = days;
            let advisory = build_advisory(label, &record, variant);
            prop_assert!(word_count(&advisory) <= MAX_WORDS);
        }
    }
}
