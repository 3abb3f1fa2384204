pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 100;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;

/* field limits, mirrored by the storage layer */
pub const MAX_RECIPE_NAME_LENGTH: usize = 200;
pub const MAX_INGREDIENT_NAME_LENGTH: usize = 100;
pub const MAX_UNIT_LENGTH: usize = 25;
pub const MAX_TAG_NAME_LENGTH: usize = 100;

pub const MIN_COOKING_TIME: i32 = 1;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const RECIPE_ORDERS: &[(&str, &str)] = &[
    ("newest", "Newest first"),
    ("oldest", "Oldest first"),
    ("alphabetical", "Alphabetical"),
    ("cooking_time_asc", "Cooking time (asc)"),
    ("cooking_time_desc", "Cooking time (desc)"),
];
