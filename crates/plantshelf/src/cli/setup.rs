use clap::{Args, Parser, Subcommand, ValueEnum};
use plantshelfapp::search::{SortBy, SortOrder, VisibilityFilter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "plantshelf",
    bin_name = "plantshelf",
    version,
    disable_help_subcommand = true,
    about = "Track plants on grid shelves, their propagation lineage and tags",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding inventory.json and plantshelf.toml
    #[arg(long, global = true, env = "PLANTSHELF_DATA_DIR", value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Caller identity, recorded as owner and used by `--visibility my`
    #[arg(long, global = true, env = "PLANTSHELF_USER", help_heading = "Options")]
    pub user: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage plants
    #[command(subcommand)]
    Plant(PlantCommands),

    /// Manage shelves
    #[command(subcommand)]
    Shelf(ShelfCommands),

    /// Put an unplaced plant into an empty cell
    #[command(display_order = 10)]
    Place(CellArgs),

    /// Move a placed plant to another cell
    #[command(name = "move", display_order = 11)]
    Move(CellArgs),

    /// Take a plant off its shelf
    #[command(display_order = 12)]
    Unplace {
        /// Plant id (or unique prefix)
        plant: String,
    },

    /// Set the parent of a plant; omit the parent to make it a root
    #[command(display_order = 20)]
    Parent {
        /// Child plant id
        child: String,
        /// Parent plant id
        parent: Option<String>,
    },

    /// Show ancestors and descendants of a plant
    #[command(display_order = 21)]
    Lineage {
        /// Plant id
        plant: String,
    },

    /// Search plants by text, tags and visibility
    #[command(display_order = 30)]
    Search {
        /// Text to look for in name and description
        query: Option<String>,

        /// Required tag (repeatable; all must match)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[arg(long, value_enum, default_value_t = VisibilityArg::All)]
        visibility: VisibilityArg,

        #[arg(long, value_enum, default_value_t = SortArg::Updated)]
        sort: SortArg,

        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,
    },

    /// List tags, most used first
    #[command(display_order = 31)]
    Tags,

    /// List plants due for watering
    #[command(display_order = 40)]
    Due,
}

#[derive(Args, Debug)]
pub struct CellArgs {
    /// Plant id (or unique prefix)
    pub plant: String,
    /// Shelf id (or unique prefix)
    pub shelf: String,
    /// Zero-based row
    pub row: u32,
    /// Zero-based column
    pub column: u32,
}

#[derive(Subcommand, Debug)]
pub enum PlantCommands {
    /// Add a plant
    #[command(display_order = 1)]
    Add {
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Make the plant public (default comes from configuration)
        #[arg(long)]
        public: bool,
    },

    /// List plants
    #[command(alias = "ls", display_order = 2)]
    List,

    /// Show one plant
    #[command(display_order = 3)]
    Show { plant: String },

    /// Edit name, description or visibility
    #[command(display_order = 4)]
    Edit {
        plant: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "private")]
        public: bool,

        #[arg(long)]
        private: bool,
    },

    /// Delete a plant (children are kept and become roots)
    #[command(alias = "delete", display_order = 5)]
    Rm { plant: String },

    /// Add tags to a plant
    #[command(display_order = 6)]
    Tag {
        plant: String,
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
    },

    /// Remove tags from a plant
    #[command(display_order = 7)]
    Untag {
        plant: String,
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
    },

    /// Record a watering now
    #[command(display_order = 8)]
    Water { plant: String },
}

#[derive(Subcommand, Debug)]
pub enum ShelfCommands {
    /// Add a shelf
    #[command(display_order = 1)]
    Add {
        name: String,

        #[arg(long)]
        rows: u32,

        #[arg(long)]
        columns: u32,
    },

    /// List shelves with occupancy
    #[command(alias = "ls", display_order = 2)]
    List,

    /// Show a shelf grid
    #[command(display_order = 3)]
    Show { shelf: String },

    /// Change shelf dimensions
    #[command(display_order = 4)]
    Resize { shelf: String, rows: u32, columns: u32 },

    /// Delete an empty shelf
    #[command(alias = "delete", display_order = 5)]
    Rm { shelf: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum VisibilityArg {
    All,
    Public,
    My,
}

impl From<VisibilityArg> for VisibilityFilter {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::All => VisibilityFilter::All,
            VisibilityArg::Public => VisibilityFilter::Public,
            VisibilityArg::My => VisibilityFilter::Mine,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Updated,
    Created,
    Name,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Updated => SortBy::Updated,
            SortArg::Created => SortBy::Created,
            SortArg::Name => SortBy::Name,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("plantshelf").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_defaults() {
        match parse(&["search"]).command {
            Commands::Search {
                query,
                tags,
                visibility,
                sort,
                order,
            } => {
                assert!(query.is_none());
                assert!(tags.is_empty());
                assert_eq!(visibility, VisibilityArg::All);
                assert_eq!(sort, SortArg::Updated);
                assert_eq!(order, OrderArg::Desc);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_repeated_tags_and_global_flags() {
        let cli = parse(&["search", "-t", "白鯨", "--tag", "チタノタ", "--visibility", "my", "--json"]);
        assert!(cli.json);
        match cli.command {
            Commands::Search { tags, visibility, .. } => {
                assert_eq!(tags, vec!["白鯨", "チタノタ"]);
                assert_eq!(VisibilityFilter::from(visibility), VisibilityFilter::Mine);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parent_without_parent_clears() {
        match parse(&["parent", "abcd"]).command {
            Commands::Parent { child, parent } => {
                assert_eq!(child, "abcd");
                assert!(parent.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_edit_rejects_public_and_private() {
        let result = Cli::try_parse_from(["plantshelf", "plant", "edit", "abcd", "--public", "--private"]);
        assert!(result.is_err());
    }
}
