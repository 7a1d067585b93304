use std::path::PathBuf;

use clap::{ArgAction, Parser};

use personsearch_cli::{configured_path, init_logging, load_people, DEFAULT_DATA_DIR, DEFAULT_INDEX_DIR};
use personsearch_core::config::Config;
use personsearch_core::store::InMemoryPersonStore;
use personsearch_core::types::{IdentifierTypeRef, MatchMode, PersonRecord, SearchRequest};
use personsearch_federated::PersonSearch;
use personsearch_text::TantivyIndexClient;

/// Search people by identifier, name and attribute.
#[derive(Debug, Parser)]
#[command(name = "personsearch", version)]
struct Args {
    query: Option<String>,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,
    /// Page size (default and cap: `search.max_results`)
    #[arg(long, allow_negative_numbers = true)]
    length: Option<i64>,

    /// Match names by soundex code
    #[arg(long)]
    phonetic: bool,
    #[arg(long)]
    exact_identifier: bool,
    #[arg(long)]
    include_voided: bool,
    /// Restrict the identifier phase to these type ids (repeatable)
    #[arg(long = "identifier-type")]
    identifier_types: Vec<u64>,
    /// EXACT, START or ANYWHERE (default: `search.name_match_mode`)
    #[arg(long)]
    match_mode: Option<MatchMode>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    birth_year: Option<i32>,
    #[arg(long, value_name = "true|false")]
    dead: Option<bool>,
    #[arg(long)]
    locale: Option<String>,

    #[arg(long)]
    index_dir: Option<PathBuf>,
    /// JSON person records backing the index (default: `data.people_dir`)
    #[arg(long)]
    data: Option<PathBuf>,
    /// Print the page as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn describe(p: &PersonRecord) -> String {
    let name = p.preferred_name().map(|n| n.full_name()).unwrap_or_else(|| "(no name)".to_string());
    let gender = p.gender.as_deref().unwrap_or("-");
    let birthdate = p.birthdate.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    let ids: Vec<&str> = p.identifiers.iter().filter(|i| !i.voided).map(|i| i.identifier.as_str()).collect();
    format!("id={}  {}  gender={}  born={}  identifiers=[{}]", p.person_id, name, gender, birthdate, ids.join(", "))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let index_dir = configured_path(&config, args.index_dir, "data.index_dir", DEFAULT_INDEX_DIR)?;
    let data = configured_path(&config, args.data, "data.people_dir", DEFAULT_DATA_DIR)?;
    let search_config = config.search_config()?;

    let mut opts = SearchRequest::with_defaults("", &search_config).page(args.start, args.length);
    opts.phonetic = args.phonetic;
    opts.exact_identifier = args.exact_identifier;
    opts.include_voided = args.include_voided;
    opts.identifier_types = args.identifier_types.into_iter().map(IdentifierTypeRef).collect();
    opts.match_mode = args.match_mode.unwrap_or(opts.match_mode);
    opts.gender = args.gender;
    opts.birth_year = args.birth_year;
    opts.dead = args.dead;
    opts.locale = args.locale;

    let store = InMemoryPersonStore::new(load_people(&data)?);
    let search = PersonSearch::new(TantivyIndexClient::open(index_dir)?, config, store);
    let page = search.search(args.query.as_deref(), opts)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    println!("Found {} people{}", page.people.len(), if page.has_more { " (more available)" } else { "" });
    for (i, person) in page.people.iter().enumerate() {
        println!("  {}. {}", i + 1, describe(person));
    }
    Ok(())
}
