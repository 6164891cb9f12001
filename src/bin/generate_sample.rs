//! Writes a synthetic field survey with deliberately messy spellings
//! (accents, case, gender synonyms, multi-variety cells, blanks) so every
//! cleaning rule of the dashboard has something to do.
//!
//! Usage: `cargo run --bin generate_sample [-- out.parquet | out.csv]`
//!
//! The output format follows the extension; anything but `.csv` is Parquet.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const NATIONALITIES: &[&str] = &["Sénégalaise", "SENEGALAISE", "Malienne", "Gambienne", "Étrangère", "Etranger"];
const GENDERS: &[&str] = &["Homme", "M", "masculin", "Femme", "Féminin", "feminin"];
const PROJECTS: &[&str] = &["PAPSEN", "Projet Riz", "ProDAC"];
const VARIETIES: &[&str] = &[
    "Riz",
    "Maïs",
    "Mil, Sorgho",
    "Riz, Maïs et autres",
    "Niébé et Arachide",
    "Arachide et autre",
];

/// Region → localities; the last locality of each region is rare on purpose.
const REGIONS: &[(&str, &[&str])] = &[
    ("Thiès", &["Mbour", "Tivaouane", "Joal"]),
    ("Kolda", &["Vélingara", "Médina Yoro Foulah", "Dabo"]),
    ("Sédhiou", &["Bounkiling", "Goudomp", "Marsassoum"]),
    ("Fatick", &["Foundiougne", "Gossas", "Diakhao"]),
];

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_survey.parquet".to_string());
    let n_rows = 600;
    let survey = generate(n_rows, 42);

    let path = Path::new(&output_path);
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_csv(path, &survey)?;
    } else {
        write_parquet(path, survey)?;
    }

    println!("Wrote {n_rows} survey rows to {output_path}");
    Ok(())
}

fn generate(n_rows: usize, seed: u64) -> Survey {
    let mut rng = SimpleRng::new(seed);

    let mut nationality: Vec<Option<String>> = Vec::with_capacity(n_rows);
    let mut gender: Vec<Option<String>> = Vec::with_capacity(n_rows);
    let mut project: Vec<Option<String>> = Vec::with_capacity(n_rows);
    let mut region: Vec<Option<String>> = Vec::with_capacity(n_rows);
    let mut locality: Vec<Option<String>> = Vec::with_capacity(n_rows);
    let mut variety: Vec<Option<String>> = Vec::with_capacity(n_rows);
    let mut age: Vec<Option<f64>> = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        let (reg, locs) = REGIONS[(rng.next_u64() % REGIONS.len() as u64) as usize];
        let loc = if rng.chance(0.04) {
            locs[locs.len() - 1]
        } else {
            locs[(rng.next_u64() % (locs.len() as u64 - 1)) as usize]
        };

        nationality.push(Some(rng.pick(NATIONALITIES).to_string()));
        // A few blank genders exercise the row-dropping rule.
        gender.push((!rng.chance(0.02)).then(|| rng.pick(GENDERS).to_string()));
        project.push(Some(rng.pick(PROJECTS).to_string()));
        region.push(Some(reg.to_string()));
        locality.push(Some(loc.to_string()));
        variety.push(Some(rng.pick(VARIETIES).to_string()));
        age.push((!rng.chance(0.05)).then(|| (18.0 + rng.next_f64() * 57.0).round()));
    }

    Survey {
        text: [nationality, gender, project, region, locality, variety],
        age,
    }
}

const HEADERS: [&str; 7] = ["Nationalité", "Sexe", "Projet", "Région", "Localité", "Variété", "Age"];

/// Generated columns, in `HEADERS` order.
struct Survey {
    text: [Vec<Option<String>>; 6],
    age: Vec<Option<f64>>,
}

fn write_parquet(path: &Path, survey: Survey) -> Result<()> {
    let mut fields: Vec<Field> = HEADERS[..6]
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, true))
        .collect();
    fields.push(Field::new(HEADERS[6], DataType::Float64, true));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = survey
        .text
        .into_iter()
        .map(|col| Arc::new(StringArray::from(col)) as ArrayRef)
        .collect();
    columns.push(Arc::new(Float64Array::from(survey.age)));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Missing values are written as empty cells.
fn write_csv(path: &Path, survey: &Survey) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADERS).context("writing CSV header")?;

    for row in 0..survey.age.len() {
        let mut record: Vec<String> = survey
            .text
            .iter()
            .map(|col| col[row].clone().unwrap_or_default())
            .collect();
        record.push(survey.age[row].map(|a| a.to_string()).unwrap_or_default());
        writer.write_record(&record).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}
