use framecore::table::HeaderPolicy;
use std::env;
use std::process;

mod cli;
use cli::*;

fn main() {
    let args: Vec<String> = env::args().collect();
    let parsed_args = ProgArgs::from(args);

    if let Err(e) = run(parsed_args) {
        eprintln!("{}: {}", e.kind_name(), e);
        process::exit(1);
    }
}

fn run(args: ProgArgs) -> Result<(), framecore::Error> {
    let raw = framecore::parse_csv_file(&args.file)?;
    let header_policy = if args.no_header {
        HeaderPolicy::GenerateColumnNames
    } else {
        HeaderPolicy::TakeFirstRowAsHeaders
    };
    let table = framecore::csv_to_table(raw, header_policy, None)?;

    match args.command {
        Command::PrintColType(n) => {
            if n >= table.num_columns() {
                eprintln!("error: there are only {} columns", table.num_columns());
                process::exit(1);
            }
            println!("{}", table.schema().field(n).data_type);
        }
        Command::RowAt(n) => {
            if n >= table.num_rows() {
                eprintln!("error: only {} rows were parsed", table.num_rows());
                process::exit(1);
            }
            println!("{}", framecore::row_at(&table, n).join(","));
        }
        Command::Each(json_expr) => {
            let column = framecore::each(&table, &json_expr)?;
            for i in 0..column.len() {
                println!("{}", column.scalar_at(i));
            }
        }
        Command::Filter(json_expr) => {
            let filtered = framecore::filter(&table, &json_expr)?;
            for i in 0..filtered.num_rows() {
                println!("{}", framecore::row_at(&filtered, i).join(","));
            }
        }
        Command::DropNa => {
            let dropped = framecore::drop_na(&table)?;
            for i in 0..dropped.num_rows() {
                println!("{}", framecore::row_at(&dropped, i).join(","));
            }
        }
    }

    Ok(())
}
