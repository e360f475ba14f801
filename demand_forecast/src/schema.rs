//! Column-name constants for the historical order table.

// ── Record columns ──────────────────────────────────────────────────────────
pub const WEEK: &str = "week";
pub const LOCATION_ID: &str = "center_id";
/// Accepted in place of `center_id`
pub const LOCATION_ID_ALIAS: &str = "location_id";
pub const CATEGORY: &str = "category";
pub const MEAL_ID: &str = "meal_id";
pub const CUISINE: &str = "cuisine";
pub const NUM_ORDERS: &str = "num_orders";

/// Columns every table needs besides the location and ingredient columns
pub const REQUIRED: [&str; 5] = [WEEK, CATEGORY, MEAL_ID, CUISINE, NUM_ORDERS];

// ── Grouping keys ───────────────────────────────────────────────────────────
/// Key of the single series that spans every row of a location
pub const ALL: &str = "all";

// ── Ingredient vocabulary ───────────────────────────────────────────────────
pub mod ingredients {
    pub const DEFAULT: [&str; 30] = [
        "garlic",
        "spices",
        "herbs",
        "onion",
        "ginger",
        "cilantro",
        "basil",
        "vegetables",
        "oil",
        "water",
        "chili",
        "protein",
        "pepper",
        "sauce",
        "acid",
        "cardamom",
        "salt",
        "starch",
        "seasoning",
        "garnish",
        "cinnamon",
        "vegetable",
        "bean sprouts",
        "olive oil",
        "coconut milk",
        "cream",
        "lemongrass",
        "sugar",
        "lime juice",
        "cloves",
    ];

    /// Owned copy of the default vocabulary
    pub fn default_vocabulary() -> Vec<String> {
        DEFAULT.iter().map(|s| s.to_string()).collect()
    }
}

// ── Artifact names ──────────────────────────────────────────────────────────
pub mod artifacts {
    pub const CATEGORY_PREFIX: &str = "category_forecast_";
    pub const INGREDIENT_PREFIX: &str = "ingredient_forecast_";
    pub const REQUIREMENTS: &str = "ingredient_requirements";
    pub const EXTENSION: &str = "svg";
}
