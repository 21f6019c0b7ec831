/// Hover popup content for a restaurant, built from whatever attributes it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub vegetarian: bool,
    pub halal: bool,
}

/// The single open popup and where it is anchored.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub coordinates: geo::Point,
    pub content: PopupContent,
}

fn is_yes(value: Option<&str>) -> bool {
    value.map_or(false, |value| value.eq_ignore_ascii_case("yes"))
}

impl PopupContent {
    pub fn describe(properties: &crate::geofile::feature::FeatureMap) -> Self {
        let get = |key: &str| properties.get(key).map(String::as_str);
        let cuisine = get("cuisine");
        Self {
            name: get("name").map(str::to_string),
            cuisine: cuisine.map(str::to_string),
            // Salad places count as vegetarian even without the tag.
            vegetarian: is_yes(get("diet:vegetarian"))
                || cuisine.map_or(false, |cuisine| cuisine.eq_ignore_ascii_case("salad")),
            halal: is_yes(get("diet:halal")),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        if let Some(name) = &self.name {
            html.push_str(&format!("<h3>{}</h3>", escape(name)));
        }
        if let Some(cuisine) = &self.cuisine {
            html.push_str(&format!("<p>Cuisine: {}</p>", escape(cuisine)));
        }
        if self.vegetarian {
            html.push_str("<p><strong>This restaurant offers vegetarian options.</strong></p>");
        }
        if self.halal {
            html.push_str("<p><strong>This restaurant offers halal options.</strong></p>");
        }
        html
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::geofile::feature::FeatureMap;

    use super::PopupContent;

    fn properties(attributes: &[(&str, &str)]) -> FeatureMap {
        attributes
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[rstest]
    #[case(&[("diet:vegetarian", "yes")], true, false)]
    #[case(&[("diet:vegetarian", "YES")], true, false)]
    #[case(&[("diet:vegetarian", "only")], false, false)]
    #[case(&[("cuisine", "Salad")], true, false)]
    #[case(&[("diet:halal", "Yes")], false, true)]
    #[case(&[("cuisine", "thai"), ("diet:halal", "no")], false, false)]
    fn test_describe_diet_options(
        #[case] attributes: &[(&str, &str)],
        #[case] vegetarian: bool,
        #[case] halal: bool,
    ) {
        let content = PopupContent::describe(&properties(attributes));
        assert_eq!(vegetarian, content.vegetarian);
        assert_eq!(halal, content.halal);
    }

    #[rstest]
    fn test_html_omits_missing_fields() {
        let content = PopupContent::describe(&properties(&[("cuisine", "korean")]));
        assert_eq!("<p>Cuisine: korean</p>", content.to_html());
    }

    #[rstest]
    fn test_html_full() {
        let content = PopupContent::describe(&properties(&[
            ("name", "Fish & Greens 'n' More"),
            ("cuisine", "salad"),
            ("diet:halal", "yes"),
        ]));
        assert_eq!(
            "<h3>Fish &amp; Greens &#39;n&#39; More</h3><p>Cuisine: salad</p>\
             <p><strong>This restaurant offers vegetarian options.</strong></p>\
             <p><strong>This restaurant offers halal options.</strong></p>",
            content.to_html()
        );
    }
}
