use anyhow::Result;
use cropclock_session::{Resolution, Session};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    cropclock_core::init()?;

    let (config, _) = cropclock_core::Config::load_validated()?;
    let session = Session::from_config(&config)?;
    let resolver = session.location_resolver();

    let address = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let resolution = if address.trim().is_empty() {
        resolver.resolve_automatic().await
    } else {
        resolver.resolve_manual(&address).await
    };

    match resolution {
        Ok(Resolution::Resolved(snapshot)) => {
            println!("Location:      {}", snapshot.location_label);
            println!("Temperature:   {:.1} C", snapshot.temperature_c);
            println!("Humidity:      {:.0} %", snapshot.humidity_pct);
            match snapshot.precipitation_mm {
                Some(mm) => println!("Precipitation: {:.1} mm", mm),
                None => println!("Precipitation: n/a"),
            }
        }
        Ok(Resolution::ManualEntryRequired) => {
            println!("Device location unavailable. Run `cropclock <address>` instead.");
        }
        Ok(Resolution::Superseded) => {}
        Err(e) => {
            tracing::error!("Resolution failed: {}", e);
            println!("{}", e.display_message());
        }
    }

    let triple = session.agronomic_state().get();
    let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v));
    println!(
        "N/P/K:         {} / {} / {}",
        show(triple.nitrogen),
        show(triple.phosphorus),
        show(triple.potassium)
    );

    Ok(())
}
