use std::str::FromStr;

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::predicate::Predicate;

/// Attribute every displayable restaurant carries, and the one cuisine filters compare against.
pub const CUISINE_KEY: &str = "cuisine";

/// Label the dropdowns use for "no filter".
pub const ALL: &str = "All";

/// Diet attributes offered by the diet dropdown, serialized as their OSM tag keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display, EnumIter)]
pub enum DietAttribute {
    #[strum(serialize = "diet:vegetarian")]
    Vegetarian,
    #[strum(serialize = "diet:vegan")]
    Vegan,
    #[strum(serialize = "diet:halal")]
    Halal,
    #[strum(serialize = "diet:kosher")]
    Kosher,
    #[strum(serialize = "diet:gluten_free")]
    GlutenFree,
}

/// Cuisine values offered by the cuisine dropdown, matched literally against `cuisine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CuisineCategory {
    Korean,
    Japanese,
    Sushi,
    Chinese,
    Asian,
    Italian,
    German,
    French,
    Turkish,
    Burger,
    Pizza,
    #[strum(serialize = "fried chicken")]
    FriedChicken,
    American,
    SteakHouse,
    Breakfast,
    Chicken,
    Salad,
    Thai,
    Vietnamese,
    Malaysian,
    Filipino,
    Indian,
    Ethiopian,
}

/// How a selected diet attribute is matched.
///
/// `Yes` is the long-standing behaviour: only `yes` passes, `only` does not. `YesOrOnly` accepts
/// both and has to be opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietMatch {
    #[default]
    Yes,
    YesOrOnly,
}

impl DietMatch {
    fn predicate(&self, attribute: DietAttribute) -> Predicate {
        match self {
            DietMatch::Yes => Predicate::equals(attribute.as_ref(), "yes"),
            DietMatch::YesOrOnly => Predicate::Any(vec![
                Predicate::equals(attribute.as_ref(), "yes"),
                Predicate::equals(attribute.as_ref(), "only"),
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub attribute: Option<DietAttribute>,
    pub cuisine: Option<CuisineCategory>,
}

/// Parse a dropdown value. "All", blank and unknown values all mean no filter.
fn parse_selection<T: FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() || raw == ALL {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::debug!("Unknown filter value {:?}, showing all", raw);
            None
        }
    }
}

/// Combines the diet and cuisine dropdowns into a single predicate.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    selection: FilterSelection,
    diet_match: DietMatch,
}

impl FilterState {
    pub fn new(diet_match: DietMatch) -> Self {
        Self {
            selection: FilterSelection::default(),
            diet_match,
        }
    }

    pub fn selection(&self) -> FilterSelection {
        self.selection
    }

    pub fn diet_match(&self) -> DietMatch {
        self.diet_match
    }

    pub fn set_attribute_filter(&mut self, raw: &str) -> Predicate {
        self.selection.attribute = parse_selection(raw);
        self.predicate()
    }

    pub fn set_cuisine_filter(&mut self, raw: &str) -> Predicate {
        self.selection.cuisine = parse_selection(raw);
        self.predicate()
    }

    pub fn reset(&mut self) {
        self.selection = FilterSelection::default();
    }

    pub fn predicate(&self) -> Predicate {
        let FilterSelection { attribute, cuisine } = self.selection;
        match (attribute, cuisine) {
            (None, None) => Predicate::has(CUISINE_KEY),
            (Some(attribute), None) => Predicate::All(vec![
                Predicate::has(CUISINE_KEY),
                self.diet_match.predicate(attribute),
            ]),
            (None, Some(cuisine)) => Predicate::equals(CUISINE_KEY, cuisine.as_ref()),
            (Some(attribute), Some(cuisine)) => Predicate::All(vec![
                Predicate::equals(CUISINE_KEY, cuisine.as_ref()),
                self.diet_match.predicate(attribute),
            ]),
        }
    }
}
