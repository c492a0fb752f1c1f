//! Spec catalog
//!
//! Ordered, read-only collection of [`CommandSpec`]s. Order matters: the
//! engine walks specs in catalog order and candidate order follows it.

use std::fs;
use std::path::Path;

use crate::error::{CompletionError, Result};
use crate::post_process::PostProcess;
use crate::spec::{ArgSpec, CommandSpec, GeneratorSpec, OptionSpec, SuggestionSpec, TemplateKind};

/// The loaded command specifications
#[derive(Clone, Debug, Default)]
pub struct SpecCatalog {
    specs: Vec<CommandSpec>,
}

impl SpecCatalog {
    /// Catalog with the built-in specs
    pub fn new() -> Self {
        Self {
            specs: builtin_specs(),
        }
    }

    /// Catalog with no specs at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: Vec<CommandSpec>) -> Self {
        let mut catalog = Self::empty();
        for spec in specs {
            catalog.insert(spec);
        }
        catalog
    }

    /// Add a spec, replacing one with the same primary label in place
    pub fn insert(&mut self, spec: CommandSpec) {
        let existing = spec
            .name
            .first()
            .and_then(|label| self.specs.iter().position(|s| s.name.first() == Some(label)));
        match existing {
            Some(idx) => self.specs[idx] = spec,
            None => self.specs.push(spec),
        }
    }

    /// Load a completion spec from JSON
    pub fn load_spec(&mut self, json: &str) -> Result<()> {
        self.load_json(json, "<json>")
    }

    /// Load a completion spec from YAML
    pub fn load_yaml(&mut self, yaml: &str) -> Result<()> {
        self.load_yaml_from(yaml, "<yaml>")
    }

    fn load_yaml_from(&mut self, yaml: &str, origin: &str) -> Result<()> {
        let spec: CommandSpec =
            serde_yaml::from_str(yaml).map_err(|e| CompletionError::SpecParse {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
        self.insert(spec);
        Ok(())
    }

    fn load_json(&mut self, json: &str, origin: &str) -> Result<()> {
        let spec: CommandSpec =
            serde_json::from_str(json).map_err(|e| CompletionError::SpecParse {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
        self.insert(spec);
        Ok(())
    }

    /// Load every `.json`, `.yaml` and `.yml` spec in `dir`, in file name
    /// order. Files that fail to parse are skipped.
    pub fn load_from_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let io_err = |source| CompletionError::SpecIo {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            paths.push(entry.map_err(io_err)?.path());
        }
        paths.sort();

        let mut count = 0;
        for path in paths {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let origin = path.display().to_string();
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %origin, error = %e, "spec.read_failed");
                    continue;
                }
            };
            let loaded = match ext {
                "json" => self.load_json(&content, &origin),
                "yaml" | "yml" => self.load_yaml_from(&content, &origin),
                _ => continue,
            };
            match loaded {
                Ok(()) => count += 1,
                Err(e) => tracing::warn!(error = %e, "spec.load_failed"),
            }
        }

        tracing::debug!(dir = %dir.display(), count, "spec.directory_loaded");
        Ok(count)
    }

    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    /// Spec answering to `label`
    pub fn get(&self, label: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|s| s.has_label(label))
    }

    /// Every label of every spec, in catalog order
    pub fn labels(&self) -> Vec<&str> {
        self.specs
            .iter()
            .flat_map(|s| s.name.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn git_branches() -> GeneratorSpec {
    let pp = PostProcess::lookup("gitBranches").unwrap_or_default();
    GeneratorSpec::script("git", &["branch", "--no-color"], pp)
}

fn git_remotes() -> GeneratorSpec {
    let pp = PostProcess::lookup("gitRemotes").unwrap_or_default();
    GeneratorSpec::script("git", &["remote", "-v"], pp)
}

fn files() -> ArgSpec {
    ArgSpec::new("path").template(TemplateKind::Filepaths)
}

/// Built-in completion specs for common commands
fn builtin_specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("git")
            .description("Version control system")
            .option(
                OptionSpec::new(&["-C"])
                    .description("Run as if started in <path>")
                    .arg(ArgSpec::new("path").template(TemplateKind::Folders)),
            )
            .option(OptionSpec::new(&["--version"]).description("Print the git version"))
            .subcommand(
                CommandSpec::new("add")
                    .description("Add file contents to the index")
                    .option(OptionSpec::new(&["-A", "--all"]).description("Add all changes"))
                    .option(OptionSpec::new(&["-p", "--patch"]).description("Interactively add hunks"))
                    .arg(files().description("Files to add").variadic()),
            )
            .subcommand(
                CommandSpec::new("commit")
                    .description("Record changes to the repository")
                    .option(
                        OptionSpec::new(&["-m", "--message"])
                            .description("Commit message")
                            .arg(ArgSpec::new("message")),
                    )
                    .option(OptionSpec::new(&["-a", "--all"]).description("Stage all modified files"))
                    .option(OptionSpec::new(&["--amend"]).description("Amend previous commit")),
            )
            .subcommand(
                CommandSpec::new("checkout")
                    .description("Switch branches or restore files")
                    .option(
                        OptionSpec::new(&["-b"])
                            .description("Create and checkout new branch")
                            .arg(ArgSpec::new("branch")),
                    )
                    .arg(ArgSpec::new("branch").generator(git_branches()).optional())
                    .arg(files().variadic().optional()),
            )
            .subcommand(
                CommandSpec::new("switch")
                    .description("Switch branches")
                    .option(OptionSpec::new(&["-c", "--create"]).description("Create a new branch").arg(ArgSpec::new("branch")))
                    .arg(ArgSpec::new("branch").generator(git_branches())),
            )
            .subcommand(
                CommandSpec::new("branch")
                    .description("List, create, or delete branches")
                    .option(
                        OptionSpec::new(&["-d", "--delete"])
                            .description("Delete a branch")
                            .arg(ArgSpec::new("branch").generator(git_branches())),
                    )
                    .arg(ArgSpec::new("name").optional()),
            )
            .subcommand(
                CommandSpec::new("push")
                    .description("Update remote refs")
                    .option(OptionSpec::new(&["-u", "--set-upstream"]).description("Set upstream for branch"))
                    .option(OptionSpec::new(&["-f", "--force"]).description("Force push"))
                    .arg(ArgSpec::new("remote").generator(git_remotes()).optional())
                    .arg(ArgSpec::new("branch").generator(git_branches()).optional()),
            )
            .subcommand(
                CommandSpec::new("pull")
                    .description("Fetch and merge from remote")
                    .option(OptionSpec::new(&["--rebase"]).description("Rebase instead of merge"))
                    .arg(ArgSpec::new("remote").generator(git_remotes()).optional()),
            )
            .subcommand(
                CommandSpec::new("status")
                    .description("Show working tree status")
                    .option(OptionSpec::new(&["-s", "--short"]).description("Short format")),
            )
            .subcommand(
                CommandSpec::new("log")
                    .description("Show commit logs")
                    .option(OptionSpec::new(&["--oneline"]).description("One line per commit"))
                    .option(
                        OptionSpec::new(&["-n"])
                            .description("Number of commits")
                            .arg(ArgSpec::new("number").suggestions(&["5", "10", "20"])),
                    ),
            )
            .subcommand(
                CommandSpec::new("remote")
                    .description("Manage tracked repositories")
                    .option(OptionSpec::new(&["-v", "--verbose"]).description("Show remote url"))
                    .subcommand(
                        CommandSpec::new("add")
                            .description("Add a remote")
                            .arg(ArgSpec::new("name"))
                            .arg(ArgSpec::new("url")),
                    )
                    .subcommand(
                        CommandSpec::new("remove")
                            .alias("rm")
                            .description("Remove a remote")
                            .arg(ArgSpec::new("remote").generator(git_remotes())),
                    ),
            ),
        CommandSpec::new("docker")
            .description("Container runtime")
            .subcommand(
                CommandSpec::new("run")
                    .description("Run a container")
                    .option(OptionSpec::new(&["-d", "--detach"]).description("Run in background"))
                    .option(OptionSpec::new(&["-it"]).description("Interactive TTY"))
                    .option(OptionSpec::new(&["--rm"]).description("Remove after exit"))
                    .option(
                        OptionSpec::new(&["-p", "--publish"])
                            .description("Port mapping")
                            .arg(ArgSpec::new("port").description("host:container").suggestions(&["8080:80", "3000:3000"])),
                    )
                    .option(
                        OptionSpec::new(&["-v", "--volume"])
                            .description("Volume mapping")
                            .arg(ArgSpec::new("volume").description("host:container")),
                    )
                    .arg(
                        ArgSpec::new("image")
                            .description("Docker image")
                            .generator(GeneratorSpec::script(
                                "docker",
                                &["images", "--format", "{{.Repository}}:{{.Tag}}"],
                                PostProcess::default(),
                            ))
                            .suggestions(&["ubuntu", "alpine", "nginx", "python"]),
                    ),
            )
            .subcommand(
                CommandSpec::new("exec")
                    .description("Run a command in a running container")
                    .option(OptionSpec::new(&["-it"]).description("Interactive TTY"))
                    .arg(ArgSpec::new("container").generator(GeneratorSpec::script(
                        "docker",
                        &["ps", "--format", "{{.Names}}\t{{.Image}}"],
                        PostProcess::lookup("keyValue").unwrap_or_default(),
                    ))),
            )
            .subcommand(
                CommandSpec::new("ps")
                    .description("List containers")
                    .option(OptionSpec::new(&["-a", "--all"]).description("Show all containers")),
            )
            .subcommand(CommandSpec::new("images").description("List images"))
            .subcommand(
                CommandSpec::new("build")
                    .description("Build an image")
                    .option(OptionSpec::new(&["-t", "--tag"]).description("Image tag").arg(ArgSpec::new("tag")))
                    .option(
                        OptionSpec::new(&["-f", "--file"])
                            .description("Name of the Dockerfile")
                            .arg(files()),
                    )
                    .arg(ArgSpec::new("context").template(TemplateKind::Folders)),
            ),
        CommandSpec::new("npm")
            .description("Node package manager")
            .subcommand(
                CommandSpec::new("install")
                    .alias("i")
                    .description("Install a package")
                    .option(OptionSpec::new(&["-D", "--save-dev"]).description("Save as dev dependency"))
                    .option(OptionSpec::new(&["-g", "--global"]).description("Install globally"))
                    .arg(ArgSpec::new("package").variadic().optional()),
            )
            .subcommand(
                CommandSpec::new("run")
                    .description("Run a package script")
                    .arg(ArgSpec::new("script").suggestions(&["build", "test", "start", "dev", "lint"])),
            )
            .subcommand(CommandSpec::new("test").alias("t").description("Run the test script")),
        CommandSpec::new("cd")
            .description("Change the working directory")
            .arg(ArgSpec::new("directory").template(TemplateKind::Folders).suggestion(
                SuggestionSpec::new("-").description("Previous directory"),
            )),
        CommandSpec::new("ls")
            .description("List directory contents")
            .option(OptionSpec::new(&["-l"]).description("Long listing format"))
            .option(OptionSpec::new(&["-a", "--all"]).description("Include hidden entries"))
            .arg(files().variadic().optional()),
        CommandSpec::new("cat")
            .description("Concatenate files")
            .arg(files().variadic()),
        CommandSpec::new("code")
            .description("Visual Studio Code")
            .option(OptionSpec::new(&["-n", "--new-window"]).description("Open a new window"))
            .option(OptionSpec::new(&["-r", "--reuse-window"]).description("Reuse the last window"))
            .option(
                OptionSpec::new(&["-d", "--diff"])
                    .description("Compare two files")
                    .arg(files())
                    .arg(files()),
            )
            .arg(files().variadic().optional()),
        CommandSpec::new("kubectl")
            .description("Kubernetes CLI")
            .option(
                OptionSpec::new(&["-n", "--namespace"])
                    .description("Namespace scope")
                    .persistent()
                    .arg(ArgSpec::new("namespace").generator(GeneratorSpec::script(
                        "kubectl",
                        &["get", "namespaces", "-o", "custom-columns=:metadata.name", "--no-headers"],
                        PostProcess::default(),
                    ))),
            )
            .subcommand(
                CommandSpec::new("get")
                    .description("Display resources")
                    .arg(ArgSpec::new("resource").suggestions(&["pod", "service", "deployment", "node"])),
            )
            .subcommand(
                CommandSpec::new("logs")
                    .description("Print container logs")
                    .option(OptionSpec::new(&["-f", "--follow"]).description("Follow logs"))
                    .arg(ArgSpec::new("pod").generator(GeneratorSpec::script(
                        "kubectl",
                        &["get", "pods", "-o", "custom-columns=:metadata.name", "--no-headers"],
                        PostProcess::default(),
                    ))),
            ),
    ]
}
