//! `thinkfirst doctor` — Diagnose configuration.

use thinkfirst_config::AppConfig;
use thinkfirst_core::error::ProviderError;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ThinkFirst Doctor — Configuration Check");
    println!("==========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `thinkfirst onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config and re-run.");
            return Ok(());
        }
    };

    println!(
        "  ✅ Provider: {} ({})",
        config.default_provider,
        thinkfirst_providers::default_model(&config)
    );

    let router = thinkfirst_providers::build_from_config(&config);
    println!("  ✅ Registered providers: {}", router.list().join(", "));

    if config.has_api_key() {
        println!("  ✅ API key configured");
        if let Some(provider) = router.default() {
            let result = provider.health_check().await;
            if !matches!(result, Ok(true)) {
                issues += 1;
            }
            println!("{}", reachability_line(provider.name(), &result));
        }
    } else {
        println!("  ❌ No API key — set GROQ_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    if config.realtime.weather.api_key.is_some() {
        println!(
            "  ✅ Weather lookups enabled ({}, default {})",
            config.realtime.weather.units, config.realtime.weather.default_location
        );
    } else {
        println!("  ⚠️  Weather lookups disabled — set OPENWEATHER_API_KEY");
    }

    if config.realtime.news.api_key.is_some() {
        println!("  ✅ News lookups enabled ({})", config.realtime.news.country);
    } else {
        println!("  ⚠️  News lookups disabled — set NEWS_API_KEY");
    }

    println!(
        "  ✅ Gateway: {}:{} (origins: {})",
        config.gateway.host,
        config.gateway.port,
        config.gateway.allowed_origins.join(", ")
    );

    if config.runner.enabled {
        println!(
            "  ⚠️  Code execution enabled ({}s limit), snippets run unsandboxed",
            config.runner.timeout_secs
        );
    } else {
        println!("  ✅ Code execution disabled");
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// One status line for the default provider's health check.
fn reachability_line(name: &str, result: &Result<bool, ProviderError>) -> String {
    match result {
        Ok(true) => format!("  ✅ {name} reachable"),
        Ok(false) => format!("  ❌ {name} answered but rejected the credentials"),
        Err(e) => format!("  ❌ {name} unreachable: {e}"),
    }
}
