//! Estimate Pacific Heights sale prices from home attributes with a
//! random forest, scored on a held-out split and by 5-fold cross-validation.

use std::error::Error;

use tabml::core::{FieldKind, Row, Schema};
use tabml::io::TextLoader;
use tabml::pipeline::{
    cross_validate_regression, evaluate_regression, mean_metric, Concatenate, ExperimentConfig, OneHotEncoding,
    Pipeline, TrainerConfig,
};
use tabml::preprocessing::train_test_split;
use tabml_demos::{init_logging, load_config, thousands};

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let config = load_config(ExperimentConfig::new(
        "data/pacific-heights.csv",
        TrainerConfig::fast_forest(200, 4),
    ))?;

    let schema = Schema::new()
        .numeric(1, "Bathrooms")
        .numeric(2, "Bedrooms")
        .numeric(3, "FinishedSquareFeet")
        .label(5, FieldKind::Numeric)
        .numeric(9, "TotalRooms")
        .text(10, "UseCode");
    let data = TextLoader::new(schema)
        .delimiter(config.delimiter_byte()?)
        .has_header(config.has_header)
        .load(&config.path)?;

    let (train, test) = train_test_split(&data, config.test_fraction, config.seed)?;

    let pipeline = Pipeline::new()
        .append(OneHotEncoding::new("UseCode", "UseCodeEncoded"))
        .append(Concatenate::new(
            "Features",
            &["UseCodeEncoded", "Bathrooms", "Bedrooms", "TotalRooms", "FinishedSquareFeet"],
        ))
        .set_trainer(config.trainer.build(config.seed));

    let model = pipeline.fit(&train)?;
    let metrics = evaluate_regression(&model, &test)?;
    println!("R2 score: {:.3}", metrics.r_squared);

    let folds = cross_validate_regression(&pipeline, &data, config.folds, config.seed)?;
    let mean = mean_metric(&folds, |m| m.r_squared)?;
    println!("Mean cross-validated R2 score: {:.2}", mean);

    let input = Row::new()
        .with("Bathrooms", 1.0)
        .with("Bedrooms", 1.0)
        .with("TotalRooms", 3.0)
        .with("FinishedSquareFeet", 653.0)
        .with("UseCode", "Condominium");
    let prediction = model.predict(&input)?;
    println!(
        "Predicted price: ${}; Actual price: $665,000",
        thousands(prediction.score())
    );
    Ok(())
}
