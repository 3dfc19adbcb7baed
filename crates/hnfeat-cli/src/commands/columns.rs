use crate::cli::ColumnsArgs;
use crate::config::build_config;
use crate::error::Result;
use hnfeat::engine::config::FeaturizationConfig;
use hnfeat::engine::tasks::encoding;

pub fn run(args: ColumnsArgs) -> Result<()> {
    let app_config = build_config(&args.config)?;
    for column in columns_for(&app_config.core_config) {
        println!("{}", column);
    }
    Ok(())
}

fn columns_for(config: &FeaturizationConfig) -> Vec<String> {
    encoding::column_names(&config.encoding, config.aggregation.top_k)
}
