/// A US state with its two-letter postal code and full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    pub code: &'static str,
    pub name: &'static str,
}

/// A catalog product. Transactions draw uniformly from [`PRODUCTS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub price: f64,
}

/// The 50 canonical states, ordered by the generator's draw index.
pub const US_STATES: [UsState; 50] = [
    UsState { code: "AL", name: "Alabama" },
    UsState { code: "AK", name: "Alaska" },
    UsState { code: "AZ", name: "Arizona" },
    UsState { code: "AR", name: "Arkansas" },
    UsState { code: "CA", name: "California" },
    UsState { code: "CO", name: "Colorado" },
    UsState { code: "CT", name: "Connecticut" },
    UsState { code: "DE", name: "Delaware" },
    UsState { code: "FL", name: "Florida" },
    UsState { code: "GA", name: "Georgia" },
    UsState { code: "HI", name: "Hawaii" },
    UsState { code: "ID", name: "Idaho" },
    UsState { code: "IL", name: "Illinois" },
    UsState { code: "IN", name: "Indiana" },
    UsState { code: "IA", name: "Iowa" },
    UsState { code: "KS", name: "Kansas" },
    UsState { code: "KY", name: "Kentucky" },
    UsState { code: "LA", name: "Louisiana" },
    UsState { code: "ME", name: "Maine" },
    UsState { code: "MD", name: "Maryland" },
    UsState { code: "MA", name: "Massachusetts" },
    UsState { code: "MI", name: "Michigan" },
    UsState { code: "MN", name: "Minnesota" },
    UsState { code: "MS", name: "Mississippi" },
    UsState { code: "MO", name: "Missouri" },
    UsState { code: "MT", name: "Montana" },
    UsState { code: "NE", name: "Nebraska" },
    UsState { code: "NV", name: "Nevada" },
    UsState { code: "NH", name: "New Hampshire" },
    UsState { code: "NJ", name: "New Jersey" },
    UsState { code: "NM", name: "New Mexico" },
    UsState { code: "NY", name: "New York" },
    UsState { code: "NC", name: "North Carolina" },
    UsState { code: "ND", name: "North Dakota" },
    UsState { code: "OH", name: "Ohio" },
    UsState { code: "OK", name: "Oklahoma" },
    UsState { code: "OR", name: "Oregon" },
    UsState { code: "PA", name: "Pennsylvania" },
    UsState { code: "RI", name: "Rhode Island" },
    UsState { code: "SC", name: "South Carolina" },
    UsState { code: "SD", name: "South Dakota" },
    UsState { code: "TN", name: "Tennessee" },
    UsState { code: "TX", name: "Texas" },
    UsState { code: "UT", name: "Utah" },
    UsState { code: "VT", name: "Vermont" },
    UsState { code: "VA", name: "Virginia" },
    UsState { code: "WA", name: "Washington" },
    UsState { code: "WV", name: "West Virginia" },
    UsState { code: "WI", name: "Wisconsin" },
    UsState { code: "WY", name: "Wyoming" },
];

pub const PRODUCTS: [Product; 15] = [
    Product { id: "P001", name: "Laptop Pro 15", category: "Electronics", price: 1299.99 },
    Product { id: "P002", name: "Wireless Mouse", category: "Electronics", price: 29.99 },
    Product { id: "P003", name: "Standing Desk", category: "Home & Garden", price: 449.99 },
    Product { id: "P004", name: "Running Shoes", category: "Sports", price: 119.99 },
    Product { id: "P005", name: "Python Cookbook", category: "Books", price: 49.99 },
    Product { id: "P006", name: "Yoga Mat", category: "Sports", price: 34.99 },
    Product { id: "P007", name: "Noise-Cancel Headphones", category: "Electronics", price: 299.99 },
    Product { id: "P008", name: "Coffee Maker", category: "Home & Garden", price: 89.99 },
    Product { id: "P009", name: "Winter Jacket", category: "Clothing", price: 189.99 },
    Product { id: "P010", name: "Action Figure Set", category: "Toys", price: 24.99 },
    Product { id: "P011", name: "4K Monitor", category: "Electronics", price: 599.99 },
    Product { id: "P012", name: "Office Chair", category: "Home & Garden", price: 349.99 },
    Product { id: "P013", name: "Basketball", category: "Sports", price: 39.99 },
    Product { id: "P014", name: "Data Science Book", category: "Books", price: 54.99 },
    Product { id: "P015", name: "Bluetooth Speaker", category: "Electronics", price: 79.99 },
];

pub const CATEGORIES: [&str; 6] = [
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Toys",
];

/// Full name for a two-letter state code.
pub fn state_name(code: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|state| state.code == code)
        .map(|state| state.name)
}

/// Resolve a state value written either as a code or as a full name to its
/// canonical two-letter code.
pub fn state_code(value: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|state| state.code == value || state.name == value)
        .map(|state| state.code)
}

pub fn product_by_id(id: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|product| product.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_full_name_resolves_to_exactly_one_code() {
        for state in &US_STATES {
            let matches: Vec<_> = US_STATES
                .iter()
                .filter(|candidate| candidate.name == state.name)
                .collect();
            assert_eq!(matches.len(), 1, "{} is ambiguous", state.name);
            assert_eq!(state_code(state.name), Some(state.code));
            assert_eq!(state_code(state.code), Some(state.code));
        }
    }

    #[test]
    fn codes_are_unique_two_letter_uppercase() {
        let codes: HashSet<_> = US_STATES.iter().map(|state| state.code).collect();
        assert_eq!(codes.len(), 50);
        assert!(codes
            .iter()
            .all(|code| code.len() == 2 && code.chars().all(|ch| ch.is_ascii_uppercase())));
    }

    #[test]
    fn catalog_categories_are_known() {
        for product in &PRODUCTS {
            assert!(CATEGORIES.contains(&product.category), "{}", product.id);
            assert!(product.price > 0.0);
        }
        assert_eq!(product_by_id("P001").map(|p| p.name), Some("Laptop Pro 15"));
        assert!(product_by_id("P999").is_none());
        assert_eq!(state_name("NY"), Some("New York"));
        assert_eq!(state_code("Atlantis"), None);
    }
}
