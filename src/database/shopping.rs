use std::collections::HashMap;

use serde::Serialize;

use super::schema::ShoppingCartLine;

/// Total required amount of one ingredient across every queued recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub unit: String,
    pub total_amount: f64,
}

/// Accumulates line items of every queued recipe into per-ingredient totals.
///
/// Accumulation is keyed by ingredient id; the catalog guarantees ids map
/// to distinct (name, unit) pairs. Items are sorted by name, independent
/// of fetch order.
pub fn aggregate_shopping_list(lines: Vec<ShoppingCartLine>) -> Vec<ShoppingListItem> {
    let mut totals: HashMap<i32, ShoppingListItem> = HashMap::new();

    for line in lines {
        match totals.get_mut(&line.ingredient_id) {
            Some(item) => item.total_amount += line.amount,
            None => {
                totals.insert(
                    line.ingredient_id,
                    ShoppingListItem {
                        name: line.name,
                        unit: line.unit,
                        total_amount: line.amount,
                    },
                );
            }
        }
    }

    let mut items: Vec<ShoppingListItem> = totals.into_values().collect();
    items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.unit.cmp(&b.unit)));

    items
}

/// Renders the aggregated list as the downloadable plain-text document,
/// one `"{name} ({unit}) - {amount}"` line per ingredient.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) - {}\n",
                item.name,
                item.unit,
                format_amount(item.total_amount)
            )
        })
        .collect()
}

/// Amounts are stored with 2-decimal precision; trailing zeros are not
/// rendered.
fn format_amount(amount: f64) -> String {
    let s = format!("{:.2}", amount);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ingredient_id: i32, name: &str, unit: &str, amount: f64) -> ShoppingCartLine {
        ShoppingCartLine {
            ingredient_id,
            name: name.to_string(),
            unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn aggregate_empty_cart_is_empty() {
        assert_eq!(aggregate_shopping_list(vec![]), vec![]);
    }

    #[test]
    fn aggregate_sums_across_recipes() {
        let lines = vec![
            line(1, "flour", "g", 200.0),
            line(1, "flour", "g", 300.0),
            line(2, "sugar", "g", 50.0),
        ];

        let items = aggregate_shopping_list(lines);

        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: "flour".to_string(),
                    unit: "g".to_string(),
                    total_amount: 500.0,
                },
                ShoppingListItem {
                    name: "sugar".to_string(),
                    unit: "g".to_string(),
                    total_amount: 50.0,
                },
            ]
        );
    }

    #[test]
    fn aggregate_sorts_by_name() {
        let lines = vec![
            line(5, "vanilla", "g", 2.0),
            line(3, "butter", "g", 100.0),
            line(4, "milk", "ml", 250.0),
        ];

        let names: Vec<String> = aggregate_shopping_list(lines)
            .into_iter()
            .map(|item| item.name)
            .collect();

        assert_eq!(names, vec!["butter", "milk", "vanilla"]);
    }

    #[test]
    fn render_matches_text_contract() {
        let items = vec![
            ShoppingListItem {
                name: "flour".to_string(),
                unit: "g".to_string(),
                total_amount: 500.0,
            },
            ShoppingListItem {
                name: "milk".to_string(),
                unit: "ml".to_string(),
                total_amount: 250.5,
            },
        ];

        assert_eq!(
            render_shopping_list(&items),
            "flour (g) - 500\nmilk (ml) - 250.5\n"
        );
    }

    #[test]
    fn format_amount_trims_trailing_zeros() {
        assert_eq!(format_amount(500.0), "500");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(2.25), "2.25");
        assert_eq!(format_amount(1.10), "1.1");
    }
}
