// Entry point and interactive menu.
//
// - Option [1] loads the dataset and prints load diagnostics.
// - Options [3]-[6] change the selection; several changes typed on one line
//   are coalesced into a single refresh.
// - Option [2] renders the dashboard, option [7] exports it.
use clap::Parser;
use cobenefit_dashboard::config::{init_tracing, Args};
use cobenefit_dashboard::loader::FileSource;
use cobenefit_dashboard::output;
use cobenefit_dashboard::reports::{self, footer_meta};
use cobenefit_dashboard::util::{format_int, format_number};
use cobenefit_dashboard::{
    Benefit, ChartType, DashboardError, LoadOutcome, Region, SelectionState, Session,
};
use std::io::{self, Write};
use std::time::Instant;
use tracing::debug;

const PREVIEW_ROWS: usize = 10;

/// Print `prompt` and read one trimmed line. `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn handle_load(session: &mut Session, args: &Args) {
    let source = FileSource::new(&args.file);
    match session.load(&source) {
        Ok(LoadOutcome::AlreadyLoading) => {
            println!("A dataset load is already in progress; try again once it finishes.\n");
        }
        Ok(LoadOutcome::Loaded) => {
            if let Some(index) = session.index() {
                let meta = index.meta();
                println!(
                    "Processing dataset... ({} rows loaded, {} distinct areas)",
                    format_int(meta.rows),
                    format_int(meta.areas)
                );
                if meta.duplicate_areas > 0 {
                    println!(
                        "Note: {} rows reuse an earlier area id; the later row is shown for that area.",
                        format_int(meta.duplicate_areas)
                    );
                }
                println!("{}\n", footer_meta(meta));
            }
        }
        Err(e) => eprintln!("Failed to load CSV: {}\n", e),
    }
}

fn show_dashboard(session: &Session) {
    let Some(index) = session.index() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    match reports::build_dashboard(index, session.selection()) {
        Ok(view) => output::print_dashboard(&view, PREVIEW_ROWS),
        Err(DashboardError::EmptySelection) => {
            println!("Please select at least one co-benefit category.\n")
        }
        Err(e) => eprintln!("Error: {}\n", e),
    }
}

fn handle_region(session: &mut Session) {
    let Some(index) = session.index() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let Some(query) = read_line("Search area (blank for top areas, 'all' for every region): ") else {
        return;
    };
    if query.eq_ignore_ascii_case("all") {
        session.update_selection(Instant::now(), |sel| sel.region = Region::All);
        return;
    }
    let options: Vec<String> = index
        .region_options(&query)
        .into_iter()
        .map(str::to_string)
        .collect();
    for (i, area) in options.iter().take(PREVIEW_ROWS * 2).enumerate() {
        println!("[{}] {}", i + 1, area);
    }
    if options.len() > PREVIEW_ROWS * 2 {
        println!("... {} more", format_int(options.len() - PREVIEW_ROWS * 2));
    }
    let Some(pick) = read_line("Pick a number or type an area id: ") else {
        return;
    };
    let region = match pick.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => Region::Area(options[n - 1].clone()),
        _ => Region::parse(&pick),
    };
    session.update_selection(Instant::now(), |sel| sel.region = region);
}

fn handle_benefits(session: &mut Session) {
    for (i, b) in Benefit::ALL.iter().enumerate() {
        let mark = if session.selection().is_selected(*b) { "x" } else { " " };
        println!("[{:>2}] [{}] {}", i + 1, mark, b.label());
    }
    let Some(line) = read_line("Toggle (numbers or keys, space separated; 'all' / 'none'): ") else {
        return;
    };
    for token in line.split_whitespace() {
        let now = Instant::now();
        match token.to_ascii_lowercase().as_str() {
            "all" => session.update_selection(now, SelectionState::select_all),
            "none" => session.update_selection(now, SelectionState::clear_benefits),
            _ => {
                let benefit = token
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| Benefit::ALL.get(i).copied())
                    .or_else(|| Benefit::from_key(token));
                match benefit {
                    Some(b) => session.update_selection(now, |sel| {
                        sel.toggle(b);
                    }),
                    None => println!("Unknown co-benefit: {}", token),
                }
            }
        }
    }
}

fn handle_top_n(session: &mut Session) {
    if let Some(line) = read_line("Top-N: ") {
        let n = SelectionState::parse_top_n(&line);
        session.update_selection(Instant::now(), |sel| sel.set_top_n(n));
    }
}

fn handle_chart(session: &mut Session) {
    let Some(line) = read_line("Chart type (bar/pie/heatmap/scatter): ") else {
        return;
    };
    match ChartType::parse(&line) {
        Some(chart) => session.update_selection(Instant::now(), |sel| sel.chart = chart),
        None => println!("Invalid chart type.\n"),
    }
}

fn handle_export(session: &Session, args: &Args) {
    let Some(index) = session.index() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    match output::export_reports(&args.out_dir, index, session.selection()) {
        Ok(paths) => {
            println!("Outputs saved:");
            println!("  {}", paths.comparison.display());
            println!("  {}", paths.selected.display());
            println!("  {}\n", paths.summary.display());
        }
        Err(DashboardError::EmptySelection) => {
            println!("Please select at least one co-benefit category.\n")
        }
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

/// Waits out the coalescing window and prints a one-line refresh summary.
fn settle(session: &mut Session) {
    if !session.has_pending_refresh() {
        return;
    }
    if let Some(wait) = session.refresh_wait(Instant::now()) {
        std::thread::sleep(wait);
    }
    if !session.take_refresh(Instant::now()) {
        return;
    }
    let Some(index) = session.index() else {
        return;
    };
    let sel = session.selection();
    debug!(region = %sel.region, benefits = sel.selected_benefits().len(), top_n = sel.top_n(), "refresh");
    match reports::build_dashboard(index, sel) {
        Ok(view) => println!(
            "[{}] {} | Selected Impact = {} | Top-{} | {} co-benefits\n",
            view.mode,
            sel.region,
            format_number(view.stats.selected_impact, 2),
            sel.top_n(),
            view.stats.active_benefits
        ),
        Err(DashboardError::EmptySelection) => {
            println!("Please select at least one co-benefit category.\n")
        }
        Err(e) => eprintln!("Error: {}\n", e),
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut session = Session::new(args.top_n, args.debounce());
    if args.load {
        handle_load(&mut session, &args);
        settle(&mut session);
    }

    loop {
        println!("Co-benefit Dashboard:");
        println!("[1] Load the file");
        println!("[2] Show dashboard");
        println!("[3] Select region");
        println!("[4] Toggle co-benefits");
        println!("[5] Set Top-N");
        println!("[6] Set chart type");
        println!("[7] Export reports");
        println!("[0] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut session, &args),
            "2" => show_dashboard(&session),
            "3" => handle_region(&mut session),
            "4" => handle_benefits(&mut session),
            "5" => handle_top_n(&mut session),
            "6" => handle_chart(&mut session),
            "7" => handle_export(&session, &args),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-7.\n"),
        }
        settle(&mut session);
    }
}
