//! Categories command implementation

use crate::cli::output::{format_categories_json, format_categories_table, CategoryView};
use crate::cli::CategoriesArgs;
use crate::config::RouterConfig;

/// Handle `llm-router categories`: reads the config file (or the built-in
/// defaults when it does not exist), never a running router.
pub fn handle_categories(args: &CategoriesArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = if args.config.exists() {
        RouterConfig::load(Some(&args.config))?
    } else {
        RouterConfig::default()
    };

    let views: Vec<CategoryView> = config
        .categories
        .iter()
        .map(|(name, category)| CategoryView::from_config(name, category))
        .collect();

    if args.json {
        Ok(format_categories_json(&views)?)
    } else {
        Ok(format_categories_table(&views))
    }
}
