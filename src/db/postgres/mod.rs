mod principals;

pub use principals::PostgresPrincipalRepo;
