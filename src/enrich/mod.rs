//! Attaching images to the aggregate tables.

pub mod images;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::AppConfig;
use crate::paths::ProjectPaths;
use crate::table::models::{GroupAggregate, GroupKey};
use crate::table::parquet::{read_aggregates, write_aggregates};

use self::images::ImageResolver;

/// Look up an image for every group that has none yet. Returns how many
/// were filled in.
pub async fn enrich_groups(resolver: &ImageResolver, groups: &mut [GroupAggregate]) -> usize {
    let mut filled = 0;
    for group in groups.iter_mut().filter(|g| g.image_url.is_none()) {
        group.image_url = resolver.fetch_image(&group.key).await;
        if group.image_url.is_some() {
            filled += 1;
        }
    }
    filled
}

/// Fill `image_url` on both aggregate tables and write them back.
pub async fn run(config: &AppConfig, paths: &ProjectPaths) -> Result<()> {
    let resolver = ImageResolver::new(&config.enrichment, &config.rate_limit)?;

    for (key, path) in [
        (GroupKey::Author, paths.author_averages()),
        (GroupKey::Party, paths.party_averages()),
    ] {
        let mut groups = read_aggregates(&path, key)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filled = enrich_groups(&resolver, &mut groups).await;
        write_aggregates(&path, &groups, key)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(table = key.column(), groups = groups.len(), filled, "Images attached");
    }

    Ok(())
}
