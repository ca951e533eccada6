//! Dry run against the scripted mock display: probe display ids, read status,
//! then set the volume.
//!
//! Run with: `cargo run --example status_probe`

use mdc_console::coercion::{coerce_selection, Arguments};
use mdc_console::mock::MockConnector;
use mdc_console::{builtin_catalog, DeviceRecord, DisplayTarget, Gateway};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = builtin_catalog()?;
    let mock = MockConnector::new().with_display(1, &[1, 18, 0, 0x21, 0x10]);
    let gateway = Gateway::new(mock, catalog.clone());

    let device = DeviceRecord::new("192.168.1.50", 0).with_site("Demo");
    println!("device: {}", device.label());
    let target = DisplayTarget::from_record(&device);

    match gateway.read_status(&target).await {
        Ok(status) => println!("status: {}", serde_json::to_string(&status)?),
        Err(e) => {
            println!("status failed: {e}");
            println!("hint: {}", e.hint());
            if e.suggests_probe() {
                let ids = &mdc_console::config::config().mdc_probe_ids;
                for outcome in gateway
                    .probe_addressing_indices(&target.address, target.port, ids)
                    .await
                {
                    println!("  {outcome}");
                }
            }
        }
    }

    let target = target.with_display_id(1);
    let volume = catalog.lookup("volume")?;
    let args = coerce_selection(volume, None, "30")?;
    let reply = gateway.execute(&target, "volume", &args).await?;
    println!("volume set, reply: {reply:?}");

    let status = gateway.read_status(&target).await?;
    println!("input source: {}", status.input_source);

    let raw = gateway
        .execute(&target, "mute", &Arguments::raw_override("ON"))
        .await?;
    println!("raw mute reply: {raw:?}");
    Ok(())
}
