pub use super::bookings::Entity as Bookings;
pub use super::cinemas::Entity as Cinemas;
pub use super::cities::Entity as Cities;
pub use super::genres::Entity as Genres;
pub use super::languages::Entity as Languages;
pub use super::movie_genres::Entity as MovieGenres;
pub use super::movie_languages::Entity as MovieLanguages;
pub use super::movies::Entity as Movies;
pub use super::seats::Entity as Seats;
pub use super::slots::Entity as Slots;
pub use super::tickets::Entity as Tickets;
pub use super::users::Entity as Users;
