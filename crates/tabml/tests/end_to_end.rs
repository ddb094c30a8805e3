use std::io::Write;

use tabml::core::{FieldKind, MlError, Row, Schema, Table};
use tabml::io::{load_model, save_model, TextLoader};
use tabml::pipeline::{
    cross_validate_regression, evaluate_binary, mean_metric, Concatenate, FeaturizeText, OneHotEncoding, Pipeline,
    Prediction, TrainerConfig,
};
use tabml::preprocessing::train_test_split;
use tempfile::NamedTempFile;

const HOUSES_HEADER: &str =
    "Id,Bathrooms,Bedrooms,FinishedSquareFeet,LastSoldDate,LastSoldPrice,Latitude,Longitude,Neighborhood,TotalRooms,UseCode";

fn houses_schema() -> Schema {
    Schema::new()
        .numeric(1, "Bathrooms")
        .numeric(2, "Bedrooms")
        .numeric(3, "FinishedSquareFeet")
        .label(5, FieldKind::Numeric)
        .numeric(9, "TotalRooms")
        .text(10, "UseCode")
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn houses_pipeline(trainer: TrainerConfig) -> Pipeline {
    Pipeline::new()
        .append(OneHotEncoding::new("UseCode", "UseCodeEncoded"))
        .append(Concatenate::new(
            "Features",
            &["UseCodeEncoded", "Bathrooms", "Bedrooms", "TotalRooms", "FinishedSquareFeet"],
        ))
        .set_trainer(trainer.build(Some(42)))
}

fn condo_row() -> Row {
    Row::new()
        .with("Bathrooms", 1.0)
        .with("Bedrooms", 1.0)
        .with("TotalRooms", 3.0)
        .with("FinishedSquareFeet", 653.0)
        .with("UseCode", "Condominium")
}

#[test]
fn regression_prediction_stays_in_training_range() {
    let rows = [
        "1,1,1,640,2015-01-02,655000,37.79,-122.43,Pacific Heights,3,Condominium",
        "2,1,1,653,2015-02-10,665000,37.79,-122.43,Pacific Heights,3,Condominium",
        "3,1,1,670,2015-03-15,672000,37.79,-122.43,Pacific Heights,3,Condominium",
        "4,1.5,1,700,2015-04-01,690000,37.79,-122.43,Pacific Heights,4,Condominium",
        "5,1,2,660,2015-05-20,668000,37.79,-122.43,Pacific Heights,3,Condominium",
    ];
    let file = write_temp(&format!("{}\n{}\n", HOUSES_HEADER, rows.join("\n")));
    let table = TextLoader::new(houses_schema()).load(file.path()).unwrap();
    assert_eq!(table.n_rows(), 5);

    let model = houses_pipeline(TrainerConfig::fast_forest(200, 4)).fit(&table).unwrap();
    let score = model.predict(&condo_row()).unwrap().score();
    assert!((655000.0..=690000.0).contains(&score), "predicted {}", score);
}

fn synthetic_houses(n: usize) -> Table {
    let mut csv = String::from(HOUSES_HEADER);
    for i in 0..n {
        let bedrooms = 1 + i % 4;
        let bathrooms = 1.0 + (i % 3) as f64 * 0.5;
        let rooms = bedrooms + 2;
        let sqft = 500 + 300 * bedrooms + (i * 37) % 150;
        let (use_code, premium) = if i % 3 == 0 { ("SingleFamily", 400_000) } else { ("Condominium", 0) };
        let price = 200_000 + 700 * sqft + premium;
        csv.push_str(&format!(
            "\n{},{},{},{},2015-01-01,{},37.79,-122.43,Pacific Heights,{},{}",
            i, bathrooms, bedrooms, sqft, price, rooms, use_code
        ));
    }
    TextLoader::new(houses_schema()).load_from_reader(csv.as_bytes()).unwrap()
}

#[test]
fn forest_cross_validation_explains_variance() {
    let table = synthetic_houses(60);
    let pipeline = houses_pipeline(TrainerConfig::fast_forest(40, 2));
    let folds = cross_validate_regression(&pipeline, &table, 5, Some(42)).unwrap();
    assert_eq!(folds.len(), 5);
    let mean_r2 = mean_metric(&folds, |m| m.r_squared).unwrap();
    assert!(mean_r2 > 0.6, "mean r2 {}", mean_r2);
}

#[test]
fn split_then_train_then_persist() {
    let table = synthetic_houses(80);
    let (train, test) = train_test_split(&table, 0.2, Some(42)).unwrap();
    assert_eq!(train.n_rows() + test.n_rows(), 80);

    let model = houses_pipeline(TrainerConfig::fast_forest(30, 2)).fit(&train).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("houses.json");
    save_model(&model, &path).unwrap();
    let loaded = load_model(&path).unwrap();
    let a = model.predict(&condo_row()).unwrap().score();
    let b = loaded.predict(&condo_row()).unwrap().score();
    assert!((a - b).abs() < 1e-6);

    let incomplete = Row::new().with("Bathrooms", 1.0).with("UseCode", "Condominium");
    assert!(matches!(model.predict(&incomplete), Err(MlError::MissingField { .. })));
}

#[test]
fn spam_scores_higher_than_ham() {
    let spam = [
        "WINNER!! You have been selected for a free cash prize, call now",
        "Cheap meds online, order now and save $$$",
        "Free entry to win a brand new phone, text WIN now",
        "URGENT: claim your free prize before midnight",
        "Lowest prices on meds, why pay more, order online",
        "Congratulations, you won a free cruise, call to claim",
    ];
    let ham = [
        "Are we still on for lunch tomorrow?",
        "Can you send me the revenue projections by Friday?",
        "The meeting in Atlanta moved to the 16th",
        "Thanks for the notes, I'll fold them into the forecast",
        "I'd like to get the team together to discuss the plan",
        "See you at the office in the morning",
    ];
    let mut csv = String::from("Label,Text\n");
    for (s, h) in spam.iter().zip(ham.iter()) {
        csv.push_str(&format!("spam,\"{}\"\nham,\"{}\"\n", s, h));
    }
    let schema = Schema::new().label(0, FieldKind::Boolean).text(1, "Text");
    let table = TextLoader::new(schema).load_from_reader(csv.as_bytes()).unwrap();

    let model = Pipeline::new()
        .append(FeaturizeText::new("Text", "Features"))
        .set_trainer(TrainerConfig::logistic().build(Some(42)))
        .fit(&table)
        .unwrap();

    let metrics = evaluate_binary(&model, &table).unwrap();
    assert!(metrics.accuracy > 0.9, "accuracy {}", metrics.accuracy);

    let probability = |text: &str| match model.predict(&Row::new().with("Text", text)).unwrap() {
        Prediction::Binary { probability, .. } => probability,
        other => panic!("expected a binary prediction, got {:?}", other),
    };
    let spammy = probability("Why pay more for expensive meds when you can order them online and save $$$?");
    let benign = probability("Can you attend a meeting in Atlanta on the 16th? I'd like to get the team together.");
    assert!(spammy > benign, "spam {} <= ham {}", spammy, benign);
}
