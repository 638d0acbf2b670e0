pub mod handle;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

pub use volunet_shared::project::*;

pub static INSTANCE: Lazy<ProjectManager> = Lazy::new(ProjectManager::new);
pub static DONATIONS: Lazy<DonationManager> = Lazy::new(DonationManager::new);

pub fn save_project(_project: &Project) {
    #[cfg(not(test))]
    {
        if crate::config::INSTANCE.demo_mode {
            return;
        }

        let this = _project.clone();

        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;

            if let Ok(mut file) =
                tokio::fs::File::create(format!("./data/projects/{}.toml", this.id)).await
            {
                file.write_all(toml::to_string(&this).unwrap().as_bytes())
                    .await
                    .unwrap()
            }
        });
    }
}

pub fn remove_project_file(_id: u64) {
    #[cfg(not(test))]
    {
        if crate::config::INSTANCE.demo_mode {
            return;
        }

        tokio::spawn(async move {
            let _ = tokio::fs::remove_file(format!("./data/projects/{}.toml", _id)).await;
        });
    }
}

pub fn save_donation(_donation: &Donation) {
    #[cfg(not(test))]
    {
        if crate::config::INSTANCE.demo_mode {
            return;
        }

        let this = _donation.clone();

        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;

            if let Ok(mut file) =
                tokio::fs::File::create(format!("./data/donations/{}.toml", this.id)).await
            {
                file.write_all(toml::to_string(&this).unwrap().as_bytes())
                    .await
                    .unwrap()
            }
        });
    }
}

pub fn remove_donation_file(_id: u64) {
    #[cfg(not(test))]
    {
        if crate::config::INSTANCE.demo_mode {
            return;
        }

        tokio::spawn(async move {
            let _ = tokio::fs::remove_file(format!("./data/donations/{}.toml", _id)).await;
        });
    }
}

pub struct ProjectManager {
    projects: RwLock<Vec<RwLock<Project>>>,
    /// An index cache for getting index from an id.
    index: DashMap<u64, usize>,
}

impl ProjectManager {
    /// Read and create a project manager from `./data/projects`,
    /// or from the demo seed in demo mode.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            use std::fs::{self, File};
            use std::io::Read;

            if crate::config::INSTANCE.demo_mode {
                return Self::demo();
            }

            let mut vec = Vec::new();
            let index = DashMap::new();
            let mut i = 0;
            for dir in fs::read_dir("./data/projects").unwrap() {
                if let Ok(project) = dir.map(|e| {
                    toml::from_str::<Project>(&{
                        let mut string = String::new();
                        File::open(e.path())
                            .unwrap()
                            .read_to_string(&mut string)
                            .unwrap();
                        string
                    })
                    .unwrap()
                }) {
                    index.insert(project.id, i);
                    vec.push(RwLock::new(project));
                    i += 1;
                }
            }
            Self {
                projects: RwLock::new(vec),
                index,
            }
        }

        #[cfg(test)]
        Self {
            projects: RwLock::new(Vec::new()),
            index: DashMap::new(),
        }
    }

    /// The seeded in-memory store selected by `demo_mode`:
    /// one approved funding project owned by the demo coordinator.
    #[cfg(not(test))]
    fn demo() -> Self {
        let this = Self {
            projects: RwLock::new(Vec::new()),
            index: DashMap::new(),
        };
        let coordinator = crate::account::id_from_email("coordinator@volunet.org");
        let admin = crate::account::id_from_email("admin@volunet.org");
        this.push(Project {
            id: 1,
            name: "Community kitchen".to_string(),
            description: "Warm meals for the neighbourhood, every weekend.".to_string(),
            coordinator,
            target_amount: 250_000,
            collected_amount: 0,
            image_url: None,
            bank_details: None,
            status: ProjectStatus::Funding,
            moderation: vec![
                ModerationRecord {
                    operator: coordinator,
                    status: ModerationStatus::Pending,
                    comment: String::new(),
                    time: chrono::Utc::now(),
                },
                ModerationRecord {
                    operator: admin,
                    status: ModerationStatus::Approved,
                    comment: "demo seed".to_string(),
                    time: chrono::Utc::now(),
                },
            ],
            creation_time: chrono::Utc::now(),
        });
        this
    }

    /// Get inner projects.
    pub fn inner(&self) -> &RwLock<Vec<RwLock<Project>>> {
        &self.projects
    }

    /// Get inner index cache.
    pub fn index(&self) -> &DashMap<u64, usize> {
        &self.index
    }

    /// Update index cache of this instance.
    pub fn update_index(&self) {
        self.index.clear();
        for (i, project) in self.projects.read().iter().enumerate() {
            self.index.insert(project.read().id, i);
        }
    }

    /// Push a project to this instance.
    pub fn push(&self, project: Project) {
        let mut projects = self.projects.write();
        self.index.insert(project.id, projects.len());
        projects.push(RwLock::new(project));
    }

    /// Indicates if the target id is already contained in this instance.
    pub fn contains_id(&self, id: u64) -> bool {
        self.index.contains_key(&id)
    }

    /// Remove the target project entry and its backing file.
    pub fn remove(&self, id: u64) {
        {
            // resolve the position under the write guard, the cached
            // index may be stale by the time the guard is held
            let mut projects = self.projects.write();
            if let Some(index) = projects.iter().position(|p| p.read().id == id) {
                projects.remove(index);
                remove_project_file(id);
            }
        }
        self.update_index();
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.projects.write() = Vec::new();
        self.index.clear()
    }
}

/// The donation ledger. Entries are only appended, and only removed
/// when their project is deleted.
pub struct DonationManager {
    donations: RwLock<Vec<Donation>>,
}

impl DonationManager {
    fn new() -> Self {
        #[cfg(not(test))]
        {
            use std::fs::{self, File};
            use std::io::Read;

            if crate::config::INSTANCE.demo_mode {
                return Self {
                    donations: RwLock::new(Vec::new()),
                };
            }

            let mut vec = Vec::new();
            for dir in fs::read_dir("./data/donations").unwrap() {
                if let Ok(donation) = dir.map(|e| {
                    toml::from_str::<Donation>(&{
                        let mut string = String::new();
                        File::open(e.path())
                            .unwrap()
                            .read_to_string(&mut string)
                            .unwrap();
                        string
                    })
                    .unwrap()
                }) {
                    vec.push(donation)
                }
            }
            Self {
                donations: RwLock::new(vec),
            }
        }

        #[cfg(test)]
        Self {
            donations: RwLock::new(Vec::new()),
        }
    }

    /// Get inner donations.
    pub fn inner(&self) -> &RwLock<Vec<Donation>> {
        &self.donations
    }

    pub fn push(&self, donation: Donation) {
        self.donations.write().push(donation)
    }

    /// Remove all donations of the target project, as part of the
    /// project's deletion cascade.
    pub fn remove_by_project(&self, project: u64) {
        self.donations.write().retain(|donation| {
            if donation.project == project {
                remove_donation_file(donation.id);
                false
            } else {
                true
            }
        });
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.donations.write() = Vec::new();
    }
}
