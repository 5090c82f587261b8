use ansible_relay::cli::PlaybookArgs;

fn main() -> anyhow::Result<()> {
    let code = ansible_relay::run::<PlaybookArgs>()?;
    std::process::exit(code)
}
