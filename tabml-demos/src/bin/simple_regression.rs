//! Predict a state's teen birth rate from its poverty rate.

use std::error::Error;

use tabml::core::{FieldKind, Row, Schema};
use tabml::io::TextLoader;
use tabml::pipeline::{Concatenate, ExperimentConfig, NormalizeMinMax, Pipeline, TrainerConfig};
use tabml_demos::{init_logging, load_config};

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let config = load_config(ExperimentConfig::new("data/poverty.csv", TrainerConfig::sdca()))?;

    let schema = Schema::new()
        .numeric(1, "PovertyRate")
        .label_named(5, "BirthRate", FieldKind::Numeric);
    let data = TextLoader::new(schema)
        .delimiter(config.delimiter_byte()?)
        .has_header(config.has_header)
        .load(&config.path)?;

    let pipeline = Pipeline::new()
        .append(NormalizeMinMax::new("PovertyRate", "PovertyRate"))
        .append(Concatenate::new("Features", &["PovertyRate"]))
        .set_trainer(config.trainer.build(config.seed))
        .with_label("BirthRate");
    let model = pipeline.fit(&data)?;

    let prediction = model.predict(&Row::new().with("PovertyRate", 19.7))?;
    println!("Predicted birth rate: {}", prediction.score());
    Ok(())
}
