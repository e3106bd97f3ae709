//! `steamboard retention <cmd>` — schema and watchlist maintenance
//! plus a one-shot collection sweep, all without the HTTP server.

use anyhow::Context;

use sb_domain::config::Config;
use sb_steam::SteamClient;
use sb_store::Store;

use super::RetentionCommand;
use crate::jobs::seed_watchlist;

pub async fn run(cmd: RetentionCommand, config: &Config) -> anyhow::Result<()> {
    let store = Store::connect(&config.database)
        .await
        .context("connecting to database")?;
    store.init_schema().await.context("initializing schema")?;
    let steam = SteamClient::new(&config.steam).context("building steam client")?;

    match cmd {
        RetentionCommand::Init => {
            println!("schema initialized in {:?}", store.schema());
            let seeded = seed_watchlist(&store, &steam, 150).await?;
            if seeded > 0 {
                println!("seeded {seeded} most-played games into the watchlist");
            }
        }
        RetentionCommand::WatchSeedTop { limit } => {
            let most_played = steam.get_most_played(limit.max(1)).await?;
            let mut inserted = 0usize;
            for game in &most_played {
                store.upsert_watched(game.appid, &game.name, 0).await?;
                store.upsert_metadata(game, true).await?;
                inserted += 1;
            }
            println!("seeded {inserted} games");
        }
        RetentionCommand::WatchAdd { appid, title } => {
            let name = match title {
                Some(t) => t,
                // Pull the real name from the storefront when possible.
                None => steam
                    .get_app_details(appid)
                    .await
                    .ok()
                    .flatten()
                    .map(|d| d.name)
                    .unwrap_or_default(),
            };
            store.upsert_watched(appid, &name, 0).await?;
            println!("added {appid} {name}");
        }
        RetentionCommand::WatchRm { appid } => {
            store.remove_watched(appid).await?;
            println!("removed {appid}");
        }
        RetentionCommand::WatchList => {
            let watched = store.list_watched().await?;
            if watched.is_empty() {
                println!("(empty)");
            }
            for game in watched {
                let name = if game.name.is_empty() {
                    "(no title)"
                } else {
                    game.name.as_str()
                };
                println!("{} - {} ({} players)", game.appid, name, game.last_count);
            }
        }
        RetentionCommand::WatchRefreshTags => {
            let watched = store.list_watched().await?;
            let mut updated = 0usize;
            for game in &watched {
                match steam.get_app_details(game.appid).await {
                    Ok(Some(details)) => {
                        store.upsert_metadata(&details, true).await?;
                        updated += 1;
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("failed to refresh appid={}: {e}", game.appid),
                }
            }
            println!("updated tags for {updated} games");
        }
        RetentionCommand::CollectOnce => {
            let watched = store.list_watched().await?;
            if watched.is_empty() {
                println!("watchlist empty, add some appids first");
                store.close().await;
                return Ok(());
            }
            let now = sb_auth::unix_now();
            for game in &watched {
                match steam.get_player_count(game.appid).await {
                    Ok(count) => {
                        store.insert_raw(game.appid, now, count.player_count).await?;
                        store
                            .upsert_watched(game.appid, &game.name, count.player_count)
                            .await?;
                        println!(
                            "sampled appid={} ({}): {} players",
                            game.appid, game.name, count.player_count
                        );
                    }
                    Err(e) => eprintln!("failed to sample appid={}: {e}", game.appid),
                }
            }

            // Overlapping tail windows, then retention.
            let hourly = store.rollup_hourly(Some(now - 3 * 3600), None, None).await?;
            let daily = store.rollup_daily(Some(now - 3 * 86_400), None, None).await?;
            store.purge(now).await?;
            println!("rolled up {hourly} hourly and {daily} daily buckets, retention applied");
        }
    }

    store.close().await;
    Ok(())
}
