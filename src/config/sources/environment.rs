//! Environment source: `UPRTCL_AGENT__CREATOR_ID=alice` sets `agent.creator_id`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("UPRTCL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
