use super::error::Error;

/*
Reference data rows

ingredients:    name,unit           apricot jam,g
tags:           name,color,slug     breakfast,#E26C2D,breakfast
*/

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientRecord {
    pub name: String,
    pub unit: String,
}

impl TryFrom<&str> for IngredientRecord {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let columns: Vec<&str> = value.split(',').map(|c| c.trim()).collect();
        if columns.len() != 2 {
            return Err(Error::validation("Invalid row; Expected 2 columns"));
        }
        if columns.iter().any(|c| c.is_empty()) {
            return Err(Error::validation("Invalid row; Empty column"));
        }

        Ok(Self {
            name: columns[0].to_string(),
            unit: columns[1].to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagRecord {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl TryFrom<&str> for TagRecord {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let columns: Vec<&str> = value.split(',').map(|c| c.trim()).collect();
        if columns.len() != 3 {
            return Err(Error::validation("Invalid row; Expected 3 columns"));
        }
        if columns.iter().any(|c| c.is_empty()) {
            return Err(Error::validation("Invalid row; Empty column"));
        }
        if !is_hex_color(columns[1]) {
            return Err(Error::validation("Invalid row; Invalid color"));
        }

        Ok(Self {
            name: columns[0].to_string(),
            color: columns[1].to_string(),
            slug: columns[2].to_string(),
        })
    }
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };

    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parses ingredient rows, skipping malformed ones with a warning.
pub fn parse_ingredient_records(input: &str) -> Vec<IngredientRecord> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match IngredientRecord::try_from(line) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping ingredient row {line:?}: {e}");
                None
            }
        })
        .collect()
}

pub fn parse_tag_records(input: &str) -> Vec<TagRecord> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match TagRecord::try_from(line) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping tag row {line:?}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingredient_rows() {
        let records = parse_ingredient_records("flour,g\nmilk,ml\n");

        assert_eq!(
            records,
            vec![
                IngredientRecord {
                    name: "flour".to_string(),
                    unit: "g".to_string(),
                },
                IngredientRecord {
                    name: "milk".to_string(),
                    unit: "ml".to_string(),
                },
            ]
        );
    }

    #[test]
    fn skips_rows_with_wrong_column_count() {
        let records = parse_ingredient_records("flour,g\nsalt\nmilk,ml,extra\nsugar,g");

        let names: Vec<String> = records.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["flour", "sugar"]);
    }

    #[test]
    fn skips_blank_lines() {
        let records = parse_ingredient_records("\nflour,g\n\n");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn parses_tag_rows() {
        let records = parse_tag_records("breakfast,#E26C2D,breakfast\nlunch,#49B64E,lunch");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slug, "breakfast");
        assert_eq!(records[1].color, "#49B64E");
    }

    #[test]
    fn skips_tag_rows_with_bad_color() {
        let records = parse_tag_records("dinner,purple,dinner\nsupper,#8775D2,supper");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "supper");
    }

    #[test]
    fn hex_color_validation() {
        assert!(is_hex_color("#E26C2D"));
        assert!(is_hex_color("#fff"));
        assert!(!is_hex_color("E26C2D"));
        assert!(!is_hex_color("#E26C2"));
        assert!(!is_hex_color("#GGGGGG"));
    }
}
