use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clozex_stimuli::{StimulusTable, standard_orders};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

/// `clozex shuffle`: writes `orders` constrained orders of a block, one
/// group per order.
pub fn execute(input: PathBuf, output: Option<PathBuf>, orders: usize, seed: Option<u64>) -> Result<()> {
    let table = StimulusTable::from_path(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let shuffled = StimulusTable::new(table.name.clone(), standard_orders(&table.trials, orders, &mut rng)?);
    match &output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            shuffled.write_csv(file)?;
        }
        None => shuffled.write_csv(io::stdout().lock())?,
    }

    info!(
        input = %input.display(),
        rows = table.len(),
        orders,
        "wrote pseudorandomized orders"
    );
    Ok(())
}
