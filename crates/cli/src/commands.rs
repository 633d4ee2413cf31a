use clap::Subcommand;
use model::records::field::ContactField;

#[derive(Subcommand)]
pub enum Commands {
    /// Page through an address book
    Browse {
        #[arg(long, help = "JSON file holding an array of contacts")]
        contacts: String,

        #[arg(long, help = "Settings file path")]
        settings: Option<String>,

        #[arg(long, help = "Locale to sort by, overrides the settings file")]
        locale: Option<String>,

        #[arg(
            long,
            value_delimiter = ',',
            default_values = ["family_name", "given_name"],
            help = "Sort fields, most significant first"
        )]
        sort: Vec<ContactField>,

        #[arg(long, help = "Only show contacts matching this query")]
        filter: Option<String>,

        #[arg(long, default_value_t = 10, help = "Contacts per page")]
        page_size: u32,

        #[arg(long, help = "Start at the first contact under this alphabet label")]
        letter: Option<String>,

        #[arg(
            long,
            help = "Switch to this locale after the first page and browse again"
        )]
        switch_locale: Option<String>,

        #[arg(long, help = "Print pages as JSON instead of a table")]
        json: bool,
    },
    /// Print the alphabet labels of a locale
    Alphabet {
        #[arg(long, default_value = "POSIX")]
        locale: String,
    },
}
