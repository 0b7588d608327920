use anyhow::{anyhow, Context, Result};
use clap::{arg, command, value_parser, ArgAction, ArgMatches, Command};
use echocheck::assertions::assert_status;
use echocheck::config::Settings;
use echocheck::execute::run_suite;
use echocheck::http_request::{parse_header_line, parse_query_pair};
use echocheck::scenarios::httpbin_suite;
use echocheck::{execute_http_request, ExecutionContext, HttpMethod, RequestSpec};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = Command::new("echocheck")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("run")
                .about("run the echo service checks")
                .arg(
                    arg!(--"base-url" <URL>)
                        .help("Base url of the echo service (default: $ECHOCHECK_BASE_URL or https://httpbin.org)")
                        .required(false)
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Set),
                )
                .arg(
                    arg!(-t --timeout <SECS>)
                        .help("Client timeout in seconds (default: $ECHOCHECK_TIMEOUT_SECS or the client default)")
                        .required(false)
                        .value_parser(value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    arg!(-o --only <NAME>)
                        .help("Only run scenarios whose name contains NAME - you can specify this argument multiple times")
                        .required(false)
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(command!("list").about("list the available checks"))
        .subcommand(
            command!("probe")
                .about("send one request and print the response")
                .arg(
                    arg!(<METHOD> "http method")
                        .required(true)
                        .value_parser(value_parser!(String)),
                )
                .arg(arg!(<URL> "absolute url").required(true).value_parser(value_parser!(String)))
                .arg(
                    arg!(-t --timeout <SECS>)
                        .help("Client timeout in seconds (default: $ECHOCHECK_TIMEOUT_SECS or the client default)")
                        .required(false)
                        .value_parser(value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    arg!(-H --header <HEADER>)
                        .help("'Name: value' header - you can specify this argument multiple times")
                        .required(false)
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(-q --query <PARAM>)
                        .help("'name=value' query parameter - you can specify this argument multiple times")
                        .required(false)
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(--json <BODY>)
                        .help("JSON request body")
                        .required(false)
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Set),
                )
                .arg(
                    arg!(--"expect-status" <CODE>)
                        .help("Fail unless the response has this status")
                        .required(false)
                        .value_parser(value_parser!(u16))
                        .action(ArgAction::Set),
                )
                .arg(
                    arg!(--strict)
                        .help("Treat 4xx/5xx responses as errors")
                        .action(ArgAction::SetTrue),
                ),
        );

    let matches = cmd.get_matches();
    let result = match matches.subcommand() {
        Some(("run", matches)) => run(matches),
        Some(("list", _)) => list(),
        Some(("probe", matches)) => probe(matches),
        _ => unreachable!("this should've been prevented"),
    };
    return result;
}

fn run(matches: &ArgMatches) -> Result<()> {
    let settings = Settings::install(Settings::resolve(
        matches.get_one::<String>("base-url").map(String::as_str),
        matches.get_one::<u64>("timeout").copied(),
    )?)?;
    let filters: Vec<&String> = matches.get_many::<String>("only").map(|it| it.collect()).unwrap_or_default();

    let scenarios: Vec<_> = httpbin_suite(&settings.base_url)?
        .into_iter()
        .filter(|scenario| filters.is_empty() || filters.iter().any(|f| scenario.matches(f)))
        .collect();
    if scenarios.is_empty() {
        return Err(anyhow!("no scenario matches {:?}", filters));
    }

    let context = ExecutionContext::from_settings(settings)?;
    println!("{} checks against {}\n", scenarios.len(), settings.base_url);
    let report = run_suite(&scenarios, &context);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(status) => println!("ok     {:<20} {} ({}ms)", outcome.name, status, outcome.elapsed.as_millis()),
            Err(err) => println!("FAILED {:<20} {}\n       {}", outcome.name, outcome.description, err),
        }
    }
    println!("\n{}", report.summary());

    return if report.all_passed() {
        Ok(())
    } else {
        Err(anyhow!("{} of {} checks failed", report.failed(), report.outcomes.len()))
    };
}

fn list() -> Result<()> {
    let settings = Settings::install(Settings::resolve(None, None)?)?;
    for scenario in httpbin_suite(&settings.base_url)? {
        println!("{:<20} {} {}", scenario.name, scenario.request.method(), scenario.request.url().path());
        println!("{:<20} {}", "", scenario.description);
        for expectation in &scenario.expectations {
            println!("{:<20}   - {}", "", expectation);
        }
    }
    Ok(())
}

fn probe(matches: &ArgMatches) -> Result<()> {
    let method: HttpMethod = matches
        .get_one::<String>("METHOD")
        .context("missing method")?
        .parse()?;
    let url = matches.get_one::<String>("URL").context("missing url")?;

    let mut builder = RequestSpec::builder(method, url.as_str()).tolerate_error_status(!matches.get_flag("strict"));
    for line in matches.get_many::<String>("header").into_iter().flatten() {
        let (name, value) = parse_header_line(line)?;
        builder = builder.header(name, value);
    }
    for pair in matches.get_many::<String>("query").into_iter().flatten() {
        let (name, value) = parse_query_pair(pair)?;
        builder = builder.query(name, value);
    }
    if let Some(body) = matches.get_one::<String>("json") {
        builder = builder.json(serde_json::from_str(body).context("while parsing --json")?);
    }
    let spec = builder.build()?;

    let settings = Settings::install(Settings::resolve(None, matches.get_one::<u64>("timeout").copied())?)?;
    let context = ExecutionContext::from_settings(settings)?;
    let response = execute_http_request(&spec, &context).with_context(|| format!("{} {}", method, spec.full_url()))?;

    let headers: String = response
        .headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect::<Vec<String>>()
        .join("\n");
    println!("{} {}\n", method, spec.full_url());
    println!("{} ({}ms)", response.status_code, response.duration_millis());
    println!("{}\n", headers);
    println!("{}", response.body_text());

    if let Some(expected) = matches.get_one::<u16>("expect-status") {
        assert_status(&response, *expected)?;
    }
    Ok(())
}
