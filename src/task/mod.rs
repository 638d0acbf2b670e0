pub mod handle;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

pub use volunet_shared::task::*;

pub static INSTANCE: Lazy<TaskManager> = Lazy::new(TaskManager::new);
pub static APPLICATIONS: Lazy<ApplicationManager> = Lazy::new(ApplicationManager::new);
pub static REPORTS: Lazy<ReportManager> = Lazy::new(ReportManager::new);

macro_rules! toml_store {
    ($save:ident, $remove:ident, $t:ty, $dir:literal) => {
        pub fn $save(_value: &$t) {
            #[cfg(not(test))]
            {
                if crate::config::INSTANCE.demo_mode {
                    return;
                }

                let this = _value.clone();

                tokio::spawn(async move {
                    use tokio::io::AsyncWriteExt;

                    if let Ok(mut file) =
                        tokio::fs::File::create(format!("./data/{}/{}.toml", $dir, this.id)).await
                    {
                        file.write_all(toml::to_string(&this).unwrap().as_bytes())
                            .await
                            .unwrap()
                    }
                });
            }
        }

        pub fn $remove(_id: u64) {
            #[cfg(not(test))]
            {
                if crate::config::INSTANCE.demo_mode {
                    return;
                }

                tokio::spawn(async move {
                    let _ = tokio::fs::remove_file(format!("./data/{}/{}.toml", $dir, _id)).await;
                });
            }
        }
    };
}

toml_store!(save_task, remove_task_file, Task, "tasks");
toml_store!(save_application, remove_application_file, Application, "applications");
toml_store!(save_report, remove_report_file, Report, "reports");

/// Load every toml record in `./data/<dir>`.
#[cfg(not(test))]
fn load_dir<T: serde::de::DeserializeOwned>(dir: &str) -> Vec<T> {
    use std::fs::{self, File};
    use std::io::Read;

    let mut vec = Vec::new();
    for entry in fs::read_dir(format!("./data/{dir}")).unwrap() {
        if let Ok(value) = entry.map(|e| {
            toml::from_str::<T>(&{
                let mut string = String::new();
                File::open(e.path())
                    .unwrap()
                    .read_to_string(&mut string)
                    .unwrap();
                string
            })
            .unwrap()
        }) {
            vec.push(value)
        }
    }
    vec
}

pub struct TaskManager {
    tasks: RwLock<Vec<RwLock<Task>>>,
    /// An index cache for getting index from an id.
    index: DashMap<u64, usize>,
}

impl TaskManager {
    /// Read and create a task manager from `./data/tasks`. Demo mode
    /// starts empty.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let this = Self {
                tasks: RwLock::new(Vec::new()),
                index: DashMap::new(),
            };
            if !crate::config::INSTANCE.demo_mode {
                for task in load_dir::<Task>("tasks") {
                    this.push(task);
                }
            }
            this
        }

        #[cfg(test)]
        Self {
            tasks: RwLock::new(Vec::new()),
            index: DashMap::new(),
        }
    }

    /// Get inner tasks.
    pub fn inner(&self) -> &RwLock<Vec<RwLock<Task>>> {
        &self.tasks
    }

    /// Get inner index cache.
    pub fn index(&self) -> &DashMap<u64, usize> {
        &self.index
    }

    /// Update index cache of this instance.
    pub fn update_index(&self) {
        self.index.clear();
        for (i, task) in self.tasks.read().iter().enumerate() {
            self.index.insert(task.read().id, i);
        }
    }

    /// Push a task to this instance.
    pub fn push(&self, task: Task) {
        let mut tasks = self.tasks.write();
        self.index.insert(task.id, tasks.len());
        tasks.push(RwLock::new(task));
    }

    /// Indicates if the target id is already contained in this instance.
    pub fn contains_id(&self, id: u64) -> bool {
        self.index.contains_key(&id)
    }

    /// Remove all tasks of the target project, as part of the
    /// project's deletion cascade.
    pub fn remove_by_project(&self, project: u64) {
        self.tasks.write().retain(|task| {
            let tr = task.read();
            if tr.project == project {
                remove_task_file(tr.id);
                false
            } else {
                true
            }
        });
        self.update_index();
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.tasks.write() = Vec::new();
        self.index.clear()
    }
}

pub struct ApplicationManager {
    applications: RwLock<Vec<RwLock<Application>>>,
}

impl ApplicationManager {
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let mut vec = Vec::new();
            if !crate::config::INSTANCE.demo_mode {
                for application in load_dir::<Application>("applications") {
                    vec.push(RwLock::new(application));
                }
            }
            Self {
                applications: RwLock::new(vec),
            }
        }

        #[cfg(test)]
        Self {
            applications: RwLock::new(Vec::new()),
        }
    }

    /// Get inner applications.
    pub fn inner(&self) -> &RwLock<Vec<RwLock<Application>>> {
        &self.applications
    }

    /// Push an application, rejecting a second application for the
    /// same (volunteer, project) pair in any status. The check and
    /// the insert run under one write guard so racing applications
    /// cannot both land.
    pub fn try_push(&self, application: Application) -> Result<(), crate::Error> {
        let mut applications = self.applications.write();
        if applications.iter().any(|a| {
            let ar = a.read();
            ar.project == application.project && ar.volunteer == application.volunteer
        }) {
            return Err(crate::Error::DuplicateApplication);
        }
        applications.push(RwLock::new(application));
        Ok(())
    }

    /// Indicates if the target volunteer holds an approved
    /// application for the target project.
    pub fn approved(&self, project: u64, volunteer: u64) -> bool {
        self.applications.read().iter().any(|a| {
            let ar = a.read();
            ar.project == project
                && ar.volunteer == volunteer
                && ar.status == ApplicationStatus::Approved
        })
    }

    /// Remove all applications of the target project, as part of the
    /// project's deletion cascade.
    pub fn remove_by_project(&self, project: u64) {
        self.applications.write().retain(|application| {
            let ar = application.read();
            if ar.project == project {
                remove_application_file(ar.id);
                false
            } else {
                true
            }
        });
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.applications.write() = Vec::new();
    }
}

pub struct ReportManager {
    reports: RwLock<Vec<Report>>,
}

impl ReportManager {
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let mut vec = Vec::new();
            if !crate::config::INSTANCE.demo_mode {
                vec = load_dir::<Report>("reports");
            }
            Self {
                reports: RwLock::new(vec),
            }
        }

        #[cfg(test)]
        Self {
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Get inner reports.
    pub fn inner(&self) -> &RwLock<Vec<Report>> {
        &self.reports
    }

    pub fn push(&self, report: Report) {
        self.reports.write().push(report)
    }

    /// Remove all reports of the target project, as part of the
    /// project's deletion cascade.
    pub fn remove_by_project(&self, project: u64) {
        self.reports.write().retain(|report| {
            if report.project == project {
                remove_report_file(report.id);
                false
            } else {
                true
            }
        });
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.reports.write() = Vec::new();
    }
}
