//! Result presentation
//!
//! Turns wire candidates into display-ready cards: fallback naming for
//! partial records, probabilities as whole percentages, and a built-in
//! sample set shown when no live results exist yet.

use serde::Serialize;
use wildlens_common::api::Candidate;

/// Image shown when a candidate carries no usable image URL
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Taxonomic class label applied to every card
pub const DEFAULT_TAXON_CLASS: &str = "Insecta";

/// Display-ready species card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesCard {
    pub id: String,
    pub scientific_name: String,
    pub common_name: String,
    /// Whole percent in 0..=100
    pub confidence: u8,
    pub image: String,
    pub taxon_class: String,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// Where a results view came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsSource {
    /// Real candidates from an identification or search
    Live,
    /// Built-in sample data; must be labeled as such when displayed
    Sample,
}

/// A ranked list of cards ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub source: ResultsSource,
    pub cards: Vec<SpeciesCard>,
}

impl ResultsView {
    pub fn is_sample(&self) -> bool {
        self.source == ResultsSource::Sample
    }
}

/// Probability to whole percent, rounded half away from zero and clamped
/// to 0..=100
pub fn confidence_percent(probability: f64) -> u8 {
    ((probability * 100.0).round()).clamp(0.0, 100.0) as u8
}

/// Present candidates for display.
///
/// `None` means no identification has produced results (distinct from an
/// identification with zero matches, which is `Some` of an empty slice) and
/// yields the sample set.
pub fn present(results: Option<&[Candidate]>) -> ResultsView {
    match results {
        Some(candidates) => ResultsView {
            source: ResultsSource::Live,
            cards: candidates
                .iter()
                .enumerate()
                .map(|(index, candidate)| card_from(index, candidate))
                .collect(),
        },
        None => ResultsView {
            source: ResultsSource::Sample,
            cards: sample_cards(),
        },
    }
}

/// Detail-page description, falling back to a generic line when the record
/// carries none
pub fn detail_description(card: &SpeciesCard) -> String {
    match &card.description {
        Some(description) => description.clone(),
        None => format!(
            "The {} is a fascinating species that plays an important role in \
             its ecosystem. Detailed information for this record has not been \
             published yet.",
            card.common_name
        ),
    }
}

fn card_from(index: usize, candidate: &Candidate) -> SpeciesCard {
    let id = non_empty(&candidate.id)
        .unwrap_or_else(|| format!("species-{index}"));

    let scientific_name =
        non_empty(&candidate.name).unwrap_or_else(|| "Unknown Species".to_string());

    // Best common name, else the scientific name, else a literal placeholder
    let common_name = candidate
        .common_names
        .iter()
        .find_map(|name| non_empty(name))
        .or_else(|| non_empty(&candidate.name))
        .unwrap_or_else(|| "Unknown".to_string());

    let image = candidate
        .image
        .as_deref()
        .and_then(non_empty)
        .or_else(|| {
            candidate
                .images
                .iter()
                .find_map(|img| non_empty(&img.url))
        })
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    SpeciesCard {
        id,
        scientific_name,
        common_name,
        confidence: confidence_percent(candidate.probability),
        image,
        taxon_class: DEFAULT_TAXON_CLASS.to_string(),
        description: candidate.description.as_deref().and_then(non_empty),
        url: candidate.url.as_deref().and_then(non_empty),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Built-in sample cards, shown before any live identification
fn sample_cards() -> Vec<SpeciesCard> {
    let samples = [
        (
            "1",
            "Papilio polytes",
            "Common Mormon",
            94,
            "https://images.unsplash.com/photo-1526336024174-e58f5cdd8e13?w=400&h=400&fit=crop",
        ),
        (
            "2",
            "Heliconius sara",
            "Sara Longwing",
            87,
            "https://images.unsplash.com/photo-1470114716159-e389f8712fda?w=400&h=400&fit=crop",
        ),
        (
            "3",
            "Morpho peleides",
            "Blue Morpho",
            78,
            "https://images.unsplash.com/photo-1526571142338-d31e59c8b6f4?w=400&h=400&fit=crop",
        ),
        (
            "4",
            "Vanessa atalanta",
            "Red Admiral",
            71,
            "https://images.unsplash.com/photo-1478632963381-916e93b83b54?w=400&h=400&fit=crop",
        ),
    ];

    samples
        .into_iter()
        .map(
            |(id, scientific_name, common_name, confidence, image)| SpeciesCard {
                id: id.to_string(),
                scientific_name: scientific_name.to_string(),
                common_name: common_name.to_string(),
                confidence,
                image: image.to_string(),
                taxon_class: DEFAULT_TAXON_CLASS.to_string(),
                description: None,
                url: None,
            },
        )
        .collect()
}
