use crate::models::{EstimateResponse, ListingImage, RoomEstimate};

pub const DEFAULT_DESIGN_STYLE: &str = "Modern coastal";
const FLOORPLAN_HINTS: &[&str] = &["floor", "plan", "blueprint"];

/// Renovation cost bucket a room label falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Living,
    Kitchen,
    Bath,
    Bed,
    Dining,
    Hall,
    Office,
    Exterior,
    Other,
}

// Checked in order; the first kind with a matching alias wins.
const ROOM_ALIASES: &[(RoomKind, &[&str])] = &[
    (RoomKind::Living, &["living", "family", "great"]),
    (RoomKind::Kitchen, &["kitchen"]),
    (RoomKind::Bath, &["bath", "bathroom", "powder"]),
    (RoomKind::Bed, &["bed", "bedroom"]),
    (RoomKind::Dining, &["dining"]),
    (RoomKind::Hall, &["hall", "entry", "foyer"]),
    (RoomKind::Office, &["office", "study"]),
    (RoomKind::Exterior, &["exterior", "outside", "backyard", "front"]),
];

impl RoomKind {
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        ROOM_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| lower.contains(a)))
            .map(|(kind, _)| *kind)
            .unwrap_or(RoomKind::Other)
    }

    /// Low and high renovation cost in whole dollars.
    pub fn cost_range(self) -> (u64, u64) {
        match self {
            RoomKind::Living => (6_000, 15_000),
            RoomKind::Kitchen => (12_000, 35_000),
            RoomKind::Bath => (8_000, 22_000),
            RoomKind::Bed => (4_000, 12_000),
            RoomKind::Dining => (5_000, 14_000),
            RoomKind::Hall => (2_500, 6_000),
            RoomKind::Office => (3_000, 9_000),
            RoomKind::Exterior => (7_000, 20_000),
            RoomKind::Other => (2_500, 8_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BudgetEstimate {
    pub rooms: Vec<RoomEstimate>,
}

impl BudgetEstimate {
    pub fn total_low(&self) -> u64 {
        self.rooms.iter().fold(0, |acc, r| acc.saturating_add(r.low))
    }

    pub fn total_high(&self) -> u64 {
        self.rooms.iter().fold(0, |acc, r| acc.saturating_add(r.high))
    }
}

pub fn estimate_budget<I, S>(room_labels: I) -> BudgetEstimate
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let rooms = room_labels
        .into_iter()
        .map(|label| {
            let room_label = label.into();
            let (low, high) = RoomKind::from_label(&room_label).cost_range();
            RoomEstimate { room_label, low, high }
        })
        .collect();
    BudgetEstimate { rooms }
}

/// Guess a display label from an image caption, then from its URL.
pub fn infer_room_label(title: Option<&str>, url: &str) -> &'static str {
    for source in [title.unwrap_or(""), url] {
        let lower = source.to_lowercase();
        if lower.contains("kitchen") {
            return "Kitchen";
        }
        if lower.contains("bath") {
            return "Bathroom";
        }
        if lower.contains("bed") {
            return "Bedroom";
        }
        if lower.contains("living") || lower.contains("family") {
            return "Living Room";
        }
        if lower.contains("dining") {
            return "Dining Room";
        }
        if lower.contains("floor") {
            return "Floor Plan";
        }
    }
    "Room"
}

pub fn is_floorplan(text: &str) -> bool {
    let lower = text.to_lowercase();
    FLOORPLAN_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Budget every listing photo except floor plans and summarise the range.
pub fn estimate_listing(images: &[ListingImage], design_style: Option<&str>) -> EstimateResponse {
    let design_style = design_style
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DESIGN_STYLE)
        .to_string();

    let labels: Vec<&str> = images
        .iter()
        .filter(|image| !image.title.as_deref().map_or(false, is_floorplan))
        .map(|image| infer_room_label(image.title.as_deref(), &image.url))
        .filter(|label| *label != "Floor Plan")
        .collect();

    let budget = estimate_budget(labels);
    let total_low = budget.total_low();
    let total_high = budget.total_high();
    let executive_summary = format!(
        "Concept plan for {} spaces with a {} style. Estimated renovation range totals ${} to ${}.",
        budget.rooms.len(),
        design_style,
        format_dollars(total_low),
        format_dollars(total_high),
    );

    tracing::debug!(rooms = budget.rooms.len(), total_low, total_high, "estimated renovation budget");

    EstimateResponse {
        design_style,
        rooms: budget.rooms,
        total_low,
        total_high,
        executive_summary,
    }
}

/// `1234567` → `1,234,567`.
fn format_dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, title: Option<&str>) -> ListingImage {
        ListingImage {
            url: url.to_string(),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn room_kind_uses_first_matching_alias() {
        assert_eq!(RoomKind::from_label("Great Room"), RoomKind::Living);
        assert_eq!(RoomKind::from_label("Powder room"), RoomKind::Bath);
        assert_eq!(RoomKind::from_label("Primary Bedroom"), RoomKind::Bed);
        assert_eq!(RoomKind::from_label("Front porch"), RoomKind::Exterior);
        assert_eq!(RoomKind::from_label("Garage"), RoomKind::Other);
    }

    #[test]
    fn budget_totals_sum_room_ranges() {
        let budget = estimate_budget(["Kitchen", "Bathroom", "Garage"]);
        assert_eq!(budget.rooms.len(), 3);
        assert_eq!(budget.rooms[2].room_label, "Garage");
        assert_eq!(budget.total_low(), 12_000 + 8_000 + 2_500);
        assert_eq!(budget.total_high(), 35_000 + 22_000 + 8_000);
    }

    #[test]
    fn label_prefers_caption_over_url() {
        assert_eq!(
            infer_room_label(Some("Updated kitchen"), "https://x.test/bath.jpg"),
            "Kitchen"
        );
        assert_eq!(infer_room_label(Some("12 Oak Ave"), "https://x.test/bath-2.jpg"), "Bathroom");
        assert_eq!(infer_room_label(None, "https://x.test/IMG_001.jpg"), "Room");
    }

    #[test]
    fn floor_plans_are_left_out_of_the_budget() {
        let images = vec![
            image("https://x.test/kitchen.jpg", None),
            image("https://x.test/a.jpg", Some("Floor plan, level 2")),
            image("https://x.test/floor-1.jpg", None),
            image("https://x.test/b.jpg", Some("15 Elm St")),
        ];
        let estimate = estimate_listing(&images, None);
        let labels: Vec<&str> = estimate.rooms.iter().map(|r| r.room_label.as_str()).collect();
        assert_eq!(labels, vec!["Kitchen", "Room"]);
        assert_eq!(estimate.design_style, DEFAULT_DESIGN_STYLE);
        assert_eq!(estimate.total_low, 14_500);
        assert_eq!(estimate.total_high, 43_000);
        assert_eq!(
            estimate.executive_summary,
            "Concept plan for 2 spaces with a Modern coastal style. Estimated renovation range totals $14,500 to $43,000."
        );
    }

    #[test]
    fn custom_style_is_used() {
        let estimate = estimate_listing(&[], Some(" Scandinavian "));
        assert_eq!(estimate.design_style, "Scandinavian");
        assert!(estimate.rooms.is_empty());
        assert!(estimate.executive_summary.contains("$0 to $0"));
    }

    #[test]
    fn large_listings_do_not_overflow_totals() {
        let images = vec![image("https://x.test/kitchen.jpg", None); 130_000];
        let estimate = estimate_listing(&images, None);
        assert_eq!(estimate.rooms.len(), 130_000);
        assert_eq!(estimate.total_low, 1_560_000_000);
        assert_eq!(estimate.total_high, 4_550_000_000);
        assert!(estimate.executive_summary.contains("$4,550,000,000."));
    }

    #[test]
    fn dollars_are_grouped_by_thousands() {
        assert_eq!(format_dollars(0), "0");
        assert_eq!(format_dollars(950), "950");
        assert_eq!(format_dollars(2_500), "2,500");
        assert_eq!(format_dollars(1_234_567), "1,234,567");
    }
}
