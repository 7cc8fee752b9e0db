//! [`Database`] operations of the [`Memory`] database.

use common::{
    money::Currency,
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    pagination::{self, Arguments, Kind},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        building, contract, payment, room, room_type, student, user, Building,
        Contract, Payment, Room, RoomType, Student, User,
    },
    infra::{database, Database},
    read::{self, contract::Active, SearchQuery},
};

use super::{Connection, Memory, NonTx, State, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory {
            shared: self.shared.clone(),
            conn: Tx::default(),
        })
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().map_err(tracerr::wrap!())
    }
}

/// Implements selecting by ID, inserting, updating and locking rows of the
/// provided table.
macro_rules! impl_table {
    ($($table:ident: $entity:ty => $id:ty;)*) => {$(
        impl<C: Connection> Database<Select<By<Option<$entity>, $id>>>
            for Memory<C>
        {
            type Ok = Option<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<Option<$entity>, $id>>,
            ) -> Result<Self::Ok, Self::Err> {
                let id = by.into_inner();
                Ok(self.read(|s| s.$table.get(&id).cloned()).await)
            }
        }

        impl<C: Connection> Database<Insert<$entity>> for Memory<C> {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Insert(row): Insert<$entity>,
            ) -> Result<Self::Ok, Self::Err> {
                self.execute(Update(row)).await.map_err(tracerr::wrap!())
            }
        }

        impl<C: Connection> Database<Update<$entity>> for Memory<C> {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Update(row): Update<$entity>,
            ) -> Result<Self::Ok, Self::Err> {
                self.write(move |s| drop(s.$table.insert(row.id, row.clone())))
                    .map_err(tracerr::wrap!())
            }
        }

        impl<C: Connection> Database<Lock<By<$entity, $id>>> for Memory<C> {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Lock(by): Lock<By<$entity, $id>>,
            ) -> Result<Self::Ok, Self::Err> {
                self.lock_row(stringify!($table), by.into_inner().into())
                    .await;
                Ok(())
            }
        }
    )*};
}

impl_table! {
    users: User => user::Id;
    buildings: Building => building::Id;
    room_types: RoomType => room_type::Id;
    rooms: Room => room::Id;
    students: Student => student::Id;
    contracts: Contract => contract::Id;
    payments: Payment => payment::Id;
}

impl State {
    /// Removes the [`Contract`]s matching the provided predicate along with
    /// their [`Payment`]s.
    fn remove_contracts(&mut self, pred: impl Fn(&Contract) -> bool) {
        let removed = self
            .contracts
            .values()
            .filter(|c| pred(c))
            .map(|c| c.id)
            .collect::<Vec<_>>();
        self.contracts.retain(|id, _| !removed.contains(id));
        self.payments.retain(|_, p| !removed.contains(&p.contract_id));
    }

    /// Returns the [`Student`] a [`Payment`] is due from.
    fn payer(&self, payment: &Payment) -> Option<student::Id> {
        self.contracts.get(&payment.contract_id).map(|c| c.student_id)
    }

    /// Returns the active [`Contract`] matching the provided predicate.
    fn active_contract(
        &self,
        pred: impl Fn(&Contract) -> bool,
    ) -> Option<Active<Contract>> {
        self.contracts
            .values()
            .find(|c| c.is_active() && pred(c))
            .cloned()
            .map(Active)
    }
}

impl<C: Connection> Database<Delete<By<Building, building::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Building, building::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |s| {
            drop(s.buildings.remove(&id));
            let rooms = s
                .rooms
                .values()
                .filter(|r| r.building_id == id)
                .map(|r| r.id)
                .collect::<Vec<_>>();
            s.rooms.retain(|_, r| r.building_id != id);
            s.remove_contracts(|c| rooms.contains(&c.room_id));
        })
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Delete<By<Room, room::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |s| {
            drop(s.rooms.remove(&id));
            s.remove_contracts(|c| c.room_id == id);
        })
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Delete<By<Student, student::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Student, student::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |s| {
            drop(s.students.remove(&id));
            s.remove_contracts(|c| c.student_id == id);
        })
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Delete<By<Contract, contract::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |s| s.remove_contracts(|c| c.id == id))
            .map_err(tracerr::wrap!())
    }
}

impl<'l, C: Connection> Database<Select<By<Option<User>, &'l user::Login>>>
    for Memory<C>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .read(|s| s.users.values().find(|u| &u.login == login).cloned())
            .await)
    }
}

impl<C: Connection> Database<Select<By<Option<Student>, user::Id>>>
    for Memory<C>
{
    type Ok = Option<Student>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Student>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        Ok(self
            .read(|s| {
                s.students.values().find(|st| st.user_id == user_id).cloned()
            })
            .await)
    }
}

impl<C: Connection> Database<Select<By<Option<Active<Contract>>, student::Id>>>
    for Memory<C>
{
    type Ok = Option<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, student::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.active_contract(|c| c.student_id == id)).await)
    }
}

impl<C: Connection> Database<Select<By<Option<Active<Contract>>, room::Id>>>
    for Memory<C>
{
    type Ok = Option<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.active_contract(|c| c.room_id == id)).await)
    }
}

impl<C: Connection> Database<Select<By<Vec<RoomType>, ()>>> for Memory<C> {
    type Ok = Vec<RoomType>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<RoomType>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut types =
            self.read(|s| s.room_types.values().cloned().collect::<Vec<_>>())
                .await;
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }
}

/// Counts the provided [`Room`]s by their [`room::Status`].
fn count_rooms<'r>(
    rooms: impl Iterator<Item = &'r Room>,
) -> read::room::Counts {
    rooms.fold(read::room::Counts::default(), |mut counts, r| {
        counts.total += 1;
        match r.status {
            room::Status::Available => counts.available += 1,
            room::Status::Occupied => counts.occupied += 1,
            room::Status::Maintenance => counts.maintenance += 1,
        }
        counts
    })
}

impl<C: Connection>
    Database<Select<By<read::room::Counts, Option<building::Id>>>>
    for Memory<C>
{
    type Ok = read::room::Counts;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::Counts, Option<building::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let building_id = by.into_inner();
        Ok(self
            .read(|s| {
                count_rooms(s.rooms.values().filter(|r| {
                    building_id.map_or(true, |id| r.building_id == id)
                }))
            })
            .await)
    }
}

impl<C: Connection>
    Database<Select<By<Vec<read::building::Occupancy>, ()>>> for Memory<C>
{
    type Ok = Vec<read::building::Occupancy>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<read::building::Occupancy>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut stats = self
            .read(|s| {
                s.buildings
                    .values()
                    .map(|b| read::building::Occupancy {
                        building: b.clone(),
                        rooms: count_rooms(
                            s.rooms.values().filter(|r| r.building_id == b.id),
                        ),
                    })
                    .collect::<Vec<_>>()
            })
            .await;
        stats.sort_by(|a, b| a.building.name.cmp(&b.building.name));
        Ok(stats)
    }
}

impl<C: Connection> Database<Select<By<read::contract::Counts, ()>>>
    for Memory<C>
{
    type Ok = read::contract::Counts;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::contract::Counts, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .read(|s| {
                s.contracts.values().fold(
                    read::contract::Counts::default(),
                    |mut counts, c| {
                        match c.status {
                            contract::Status::Active => counts.active += 1,
                            contract::Status::Expired => counts.expired += 1,
                            contract::Status::Terminated => {
                                counts.terminated += 1;
                            }
                        }
                        counts
                    },
                )
            })
            .await)
    }
}

impl<C: Connection>
    Database<
        Select<By<Vec<Active<Contract>>, read::contract::EndingBefore>>,
    > for Memory<C>
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Active<Contract>>, read::contract::EndingBefore>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::EndingBefore(date) = by.into_inner();
        let mut contracts = self
            .read(|s| {
                s.contracts
                    .values()
                    .filter(|c| c.is_active() && c.end_date < date)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        contracts.sort_by_key(|c| (c.end_date, c.id));
        Ok(contracts.into_iter().map(Active).collect())
    }
}

impl<C: Connection>
    Database<Select<By<read::payment::Stats, read::payment::StatsScope>>>
    for Memory<C>
{
    type Ok = read::payment::Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::Stats, read::payment::StatsScope>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::StatsScope { student_id, today } = by.into_inner();
        Ok(self
            .read(|s| {
                let payments = s
                    .payments
                    .values()
                    .filter(|p| {
                        student_id.map_or(true, |id| s.payer(p) == Some(id))
                    })
                    .collect::<Vec<_>>();
                let paid = payments
                    .iter()
                    .filter(|p| p.status == payment::Status::Paid)
                    .collect::<Vec<_>>();
                let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);

                read::payment::Stats {
                    pending: count(payments.len() - paid.len()),
                    paid: count(paid.len()),
                    overdue: count(
                        payments.iter().filter(|p| p.is_overdue(today)).count(),
                    ),
                    paid_amount: Money::vnd(
                        paid.iter()
                            .filter(|p| p.amount.currency == Currency::Vnd)
                            .map(|p| p.amount.amount)
                            .sum::<rust_decimal::Decimal>(),
                    ),
                }
            })
            .await)
    }
}

impl<C: Connection>
    Database<Select<By<Vec<Payment>, read::payment::Overdue>>> for Memory<C>
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::Overdue>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::Overdue { today, limit } = by.into_inner();
        let mut payments = self
            .read(|s| {
                s.payments
                    .values()
                    .filter(|p| p.is_overdue(today))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        payments.sort_by(|a, b| b.due_date.cmp(&a.due_date));
        payments.truncate(limit.into());
        Ok(payments)
    }
}

impl<C: Connection>
    Database<Select<By<Vec<Payment>, read::payment::Upcoming>>> for Memory<C>
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::Upcoming>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::Upcoming { from, until, limit } = by.into_inner();
        let mut payments = self
            .read(|s| {
                s.payments
                    .values()
                    .filter(|p| {
                        p.status == payment::Status::Pending
                            && (from..=until).contains(&p.due_date)
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        payments.sort_by_key(|p| p.due_date);
        payments.truncate(limit.into());
        Ok(payments)
    }
}

/// Selects a [`pagination::Page`] of the provided IDs, ordered by themselves.
fn paginate<Id: Copy + Ord>(
    ids: impl IntoIterator<Item = Id>,
    arguments: &Arguments<Id>,
) -> pagination::Page<Id, Id> {
    let kind = arguments.kind();
    let mut ids = ids
        .into_iter()
        .filter(|id| {
            arguments.cursor().map_or(true, |c| match kind {
                Kind::Forward => id > c,
                Kind::ForwardIncluding => id >= c,
                Kind::Backward => id < c,
                Kind::BackwardIncluding => id <= c,
            })
        })
        .collect::<Vec<_>>();
    ids.sort_unstable();
    if kind.is_backward() {
        ids.reverse();
    }

    let has_more = ids.len() > arguments.limit();
    ids.truncate(arguments.limit());
    pagination::Page::new(
        arguments,
        ids.into_iter().map(|id| (id, id)),
        has_more,
    )
}

/// Checks whether any word of the provided [`SearchQuery`] occurs in any of
/// the provided texts, case-insensitively.
///
/// Absent [`SearchQuery`] matches everything.
fn fuzzy_matches(search: Option<&SearchQuery>, texts: &[&str]) -> bool {
    let Some(search) = search else {
        return true;
    };
    let texts = texts.iter().map(|t| t.to_lowercase()).collect::<Vec<_>>();
    search
        .as_ref()
        .split_ascii_whitespace()
        .map(str::to_lowercase)
        .any(|word| texts.iter().any(|t| t.contains(&word)))
}

/// Converts the provided number of rows into a total count.
fn total<T: From<i32>>(n: usize) -> T {
    i32::try_from(n).unwrap_or(i32::MAX).into()
}

impl<C: Connection>
    Database<
        Select<
            By<read::building::list::Page, read::building::list::Selector>,
        >,
    > for Memory<C>
{
    type Ok = read::building::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::building::list::Page, read::building::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::building::list::Selector {
            arguments,
            filter: read::building::list::Filter { search },
        } = by.into_inner();

        let ids = self
            .read(|s| {
                s.buildings
                    .values()
                    .filter(|b| {
                        fuzzy_matches(
                            search.as_ref(),
                            &[b.name.as_ref(), b.address.as_ref()],
                        )
                    })
                    .map(|b| b.id)
                    .collect::<Vec<_>>()
            })
            .await;
        Ok(paginate(ids, &arguments))
    }
}

impl<C: Connection>
    Database<Select<By<read::building::list::TotalCount, ()>>> for Memory<C>
{
    type Ok = read::building::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::building::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(total(self.read(|s| s.buildings.len()).await))
    }
}

impl<C: Connection>
    Database<Select<By<read::room::list::Page, read::room::list::Selector>>>
    for Memory<C>
{
    type Ok = read::room::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::room::list::Page, read::room::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::room::list::Selector {
            arguments,
            filter:
                read::room::list::Filter {
                    search,
                    status,
                    building_id,
                },
        } = by.into_inner();

        let ids = self
            .read(|s| {
                s.rooms
                    .values()
                    .filter(|r| status.map_or(true, |st| r.status == st))
                    .filter(|r| {
                        building_id.map_or(true, |b| r.building_id == b)
                    })
                    .filter(|r| {
                        let building =
                            s.buildings.get(&r.building_id).map(|b| &b.name);
                        let room_type =
                            s.room_types.get(&r.room_type_id).map(|t| &t.name);
                        fuzzy_matches(
                            search.as_ref(),
                            &[
                                r.number.as_ref(),
                                building.map_or("", |n| n.as_ref()),
                                room_type.map_or("", |n| n.as_ref()),
                            ],
                        )
                    })
                    .map(|r| r.id)
                    .collect::<Vec<_>>()
            })
            .await;
        Ok(paginate(ids, &arguments))
    }
}

impl<C: Connection> Database<Select<By<read::room::list::TotalCount, ()>>>
    for Memory<C>
{
    type Ok = read::room::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::room::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(total(self.read(|s| s.rooms.len()).await))
    }
}

impl<C: Connection>
    Database<
        Select<By<read::student::list::Page, read::student::list::Selector>>,
    > for Memory<C>
{
    type Ok = read::student::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::student::list::Page, read::student::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::student::list::Selector {
            arguments,
            filter: read::student::list::Filter { search },
        } = by.into_inner();

        let ids = self
            .read(|s| {
                s.students
                    .values()
                    .filter(|st| {
                        fuzzy_matches(
                            search.as_ref(),
                            &[
                                st.number.as_ref(),
                                st.full_name.as_ref(),
                                st.university.as_ref(),
                                st.faculty.as_ref(),
                            ],
                        )
                    })
                    .map(|st| st.id)
                    .collect::<Vec<_>>()
            })
            .await;
        Ok(paginate(ids, &arguments))
    }
}

impl<C: Connection> Database<Select<By<read::student::list::TotalCount, ()>>>
    for Memory<C>
{
    type Ok = read::student::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::student::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(total(self.read(|s| s.students.len()).await))
    }
}

impl<C: Connection>
    Database<
        Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    > for Memory<C>
{
    type Ok = read::contract::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::list::Selector {
            arguments,
            filter:
                read::contract::list::Filter {
                    search,
                    status,
                    student_id,
                },
        } = by.into_inner();

        let ids = self
            .read(|s| {
                s.contracts
                    .values()
                    .filter(|c| status.map_or(true, |st| c.status == st))
                    .filter(|c| {
                        student_id.map_or(true, |id| c.student_id == id)
                    })
                    .filter(|c| {
                        let student = s.students.get(&c.student_id);
                        let room = s.rooms.get(&c.room_id);
                        let building = room
                            .and_then(|r| s.buildings.get(&r.building_id));
                        fuzzy_matches(
                            search.as_ref(),
                            &[
                                c.number.as_ref(),
                                student.map_or("", |st| st.number.as_ref()),
                                student.map_or("", |st| st.full_name.as_ref()),
                                room.map_or("", |r| r.number.as_ref()),
                                building.map_or("", |b| b.name.as_ref()),
                            ],
                        )
                    })
                    .map(|c| c.id)
                    .collect::<Vec<_>>()
            })
            .await;
        Ok(paginate(ids, &arguments))
    }
}

impl<C: Connection>
    Database<Select<By<read::contract::list::TotalCount, ()>>> for Memory<C>
{
    type Ok = read::contract::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::contract::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(total(self.read(|s| s.contracts.len()).await))
    }
}

impl<C: Connection>
    Database<
        Select<By<read::payment::list::Page, read::payment::list::Selector>>,
    > for Memory<C>
{
    type Ok = read::payment::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::list::Page, read::payment::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::list::Selector {
            arguments,
            filter: read::payment::list::Filter { status, student_id },
        } = by.into_inner();

        let ids = self
            .read(|s| {
                s.payments
                    .values()
                    .filter(|p| status.map_or(true, |st| p.status == st))
                    .filter(|p| {
                        student_id.map_or(true, |id| s.payer(p) == Some(id))
                    })
                    .map(|p| p.id)
                    .collect::<Vec<_>>()
            })
            .await;
        Ok(paginate(ids, &arguments))
    }
}

impl<C: Connection> Database<Select<By<read::payment::list::TotalCount, ()>>>
    for Memory<C>
{
    type Ok = read::payment::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::payment::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(total(self.read(|s| s.payments.len()).await))
    }
}
